//! Keyword-driven assistant replies.
//!
//! Intents are checked in a fixed order and the first match wins. Contextual questions
//! are keyed by [`QuestionId`] and never repeat within a session; once they run out the
//! generic pool takes over and may repeat.

use crate::selection::SelectionModel;
use crate::types::CrewId;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    DocTarget,
    SecurityLevel,
    SocialPlatform,
    CodeStyle,
    LanguageFramework,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Help,
    Suggestions,
    Question,
    LanguageMention,
    Acknowledgement,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub intent: Intent,
    pub text: String,
    /// Contextual question included in `text`, to be recorded as asked.
    pub asked: Option<QuestionId>,
}

pub struct DialogueContext<'a> {
    pub selection: &'a SelectionModel,
    pub asked: &'a BTreeSet<QuestionId>,
    pub has_project_folder: bool,
    pub project_name: &'a str,
}

const HELP_KEYWORDS: [&str; 2] = ["help", "aide"];
const SUGGESTION_KEYWORDS: [&str; 3] = ["suggestion", "advice", "conseil"];
const QUESTION_KEYWORDS: [&str; 1] = ["question"];
const LANGUAGE_KEYWORDS: [&str; 4] = ["python", "javascript", "java", "code"];
const ACK_WORDS: [&str; 8] = ["ok", "yes", "no", "thanks", "merci", "oui", "non", "sure"];

const GENERIC_QUESTIONS: [&str; 4] = [
    "🎯 Who is the main audience of your project?",
    "⏰ Do you have any particular deadline constraints?",
    "🔄 Is the project in maintenance or active development?",
    "🌍 Will the project be deployed internationally?",
];

const ACKNOWLEDGEMENTS: [&str; 3] = [
    "Great! Is there anything else you would like to customize?",
    "Excellent! Would you like me to ask more specific questions?",
    "Nice! Type 'suggestions' for personalised recommendations.",
];

const FALLBACKS: [&str; 4] = [
    "Interesting! For '{project}' this could be really useful. 🤔",
    "I see! That helps me understand your needs. Tell me more about your project! 💡",
    "Thanks for the detail! It will help me tailor my recommendations. 🎯",
    "Perfect! These details help optimise the analysis. 🚀",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn has_word(haystack: &str, words: &[&str]) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

fn pick<'a>(options: &[&'a str], rng: &mut dyn RngCore) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct DialogueResponder;

impl DialogueResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, input: &str, context: &DialogueContext<'_>, rng: &mut dyn RngCore) -> Reply {
        let lowered = input.to_lowercase();
        let has_crews = context.selection.active_crew_count() > 0;

        if contains_any(&lowered, &HELP_KEYWORDS) {
            return plain(Intent::Help, help_text());
        }
        if contains_any(&lowered, &SUGGESTION_KEYWORDS) {
            return plain(Intent::Suggestions, suggestions(context));
        }
        // With crews selected, the first contextual question is offered unprompted.
        if contains_any(&lowered, &QUESTION_KEYWORDS) || (has_crews && context.asked.is_empty()) {
            return self.contextual_question(context, rng);
        }
        if contains_any(&lowered, &LANGUAGE_KEYWORDS) {
            return plain(Intent::LanguageMention, language_reply(context.selection));
        }
        if has_word(&lowered, &ACK_WORDS) {
            return plain(Intent::Acknowledgement, pick(&ACKNOWLEDGEMENTS, rng).to_string());
        }

        let mut text = pick(&FALLBACKS, rng).replace("{project}", context.project_name);
        if has_crews {
            text.push_str(&format!(
                "\n\nBy the way, with your current crews ({} active), shall I ask you more specific questions?",
                context.selection.active_crew_count()
            ));
        }
        plain(Intent::Fallback, text)
    }

    /// Next unasked question for the active crews and languages, else a generic one.
    pub fn contextual_question(&self, context: &DialogueContext<'_>, rng: &mut dyn RngCore) -> Reply {
        let selection = context.selection;
        if selection.active_crew_count() == 0 {
            return plain(
                Intent::Question,
                "🤔 A few questions to get started:\n\n\
                 • What is the main goal of your project?\n\
                 • Is it open source or private?\n\
                 • Do you have a development team?\n\n\
                 Your answers help me recommend the right crews!"
                    .to_string(),
            );
        }

        let languages = selection.active_languages();
        let mut candidates = [
            (CrewId::Documentation, QuestionId::DocTarget),
            (CrewId::Security, QuestionId::SecurityLevel),
            (CrewId::SocialContent, QuestionId::SocialPlatform),
            (CrewId::CodeImprovement, QuestionId::CodeStyle),
        ]
        .into_iter()
        .filter(|(crew, _)| selection.is_crew_active(*crew))
        .map(|(_, question)| question)
        .chain(languages.first().map(|_| QuestionId::LanguageFramework));

        let next = candidates.find(|question| !context.asked.contains(question));

        let (question, asked) = match next {
            Some(question) => {
                let text = match question {
                    QuestionId::DocTarget => {
                        "📚 Documentation: is your documentation aimed at developers or end users?"
                            .to_string()
                    }
                    QuestionId::SecurityLevel => {
                        "🔒 Security: does your project handle sensitive data or external APIs?"
                            .to_string()
                    }
                    QuestionId::SocialPlatform => {
                        "📱 Social: which platforms would you like to promote your project on?"
                            .to_string()
                    }
                    QuestionId::CodeStyle => {
                        "🔧 Code: do you follow specific coding standards or team conventions?"
                            .to_string()
                    }
                    QuestionId::LanguageFramework => format!(
                        "💻 {}: are you using specific frameworks (React, Django, Spring...)?",
                        languages.first().copied().unwrap_or_default()
                    ),
                };
                (text, Some(question))
            }
            None => (pick(&GENERIC_QUESTIONS, rng).to_string(), None),
        };

        Reply {
            intent: Intent::Question,
            text: format!(
                "🤔 Personalised question:\n\n{}\n\n💡 Your answers help optimise the configuration!",
                question
            ),
            asked,
        }
    }

    /// Assistant reaction to a crew being switched on or off.
    pub fn crew_reaction(&self, crew_label: &str, active: bool, rng: &mut dyn RngCore) -> String {
        let options = if active {
            vec![
                format!("👍 Excellent! You enabled {}. This crew will do great work!", crew_label),
                format!("🎯 Perfect! {} is a great choice for your project.", crew_label),
                format!(
                    "✨ Nice pick with {}! Want me to ask you some specific questions?",
                    crew_label
                ),
            ]
        } else {
            vec![
                format!(
                    "🤔 You disabled {}. It stays available if you change your mind!",
                    crew_label
                ),
                format!("👌 {} disabled. Let's focus on your other crews then!", crew_label),
            ]
        };
        options.choose(rng).cloned().unwrap_or_default()
    }
}

fn plain(intent: Intent, text: String) -> Reply {
    Reply {
        intent,
        text,
        asked: None,
    }
}

fn help_text() -> String {
    "🆘 Here is what I can do:\n\n\
     • 📊 Review your crew selection\n\
     • 🔍 Suggest optimisations\n\
     • ❓ Ask personalised questions\n\
     • 💡 Give advice for your project\n\n\
     Type 'suggestions' for recommendations!"
        .to_string()
}

fn suggestions(context: &DialogueContext<'_>) -> String {
    let selection = context.selection;
    let languages = selection.active_languages();
    let has_crews = selection.active_crew_count() > 0;

    if !has_crews && languages.is_empty() {
        return "🎯 Getting started:\n\n\
                1. Start by selecting the 📚 Documentation crew\n\
                2. Add your main language\n\
                3. For a web project, enable 🔒 Security\n\n\
                💡 For a full demo, try starting the analysis!"
            .to_string();
    }

    let mut lines = vec!["🎯 Personalised suggestions:\n".to_string()];
    match languages.len() {
        0 => {}
        1 => lines.push(format!(
            "• Great focus on {}! Consider adding automated tests.",
            languages[0]
        )),
        count if count > 5 => lines.push(format!(
            "• {} languages detected! The Code Improvement crew will be very useful.",
            count
        )),
        count => lines.push(format!(
            "• Nice multi-language stack ({} languages). Perfect for a full analysis!",
            count
        )),
    }
    if selection.is_crew_active(CrewId::Documentation) && selection.is_crew_active(CrewId::SocialContent) {
        lines.push("• Documentation + Social is a perfect combination for open source! 🌟".to_string());
    }
    if selection.is_crew_active(CrewId::Security) {
        lines.push("• Great choice with Security! Think about environment variables.".to_string());
    }
    if !context.has_project_folder {
        lines.push("• 💡 Tip: select a folder for a real analysis, or use demo mode!".to_string());
    }
    lines.push("\n❓ Would you like me to ask more specific questions?".to_string());
    lines.join("\n")
}

fn language_reply(selection: &SelectionModel) -> String {
    let languages = selection.active_languages();
    if languages.is_empty() {
        return "The languages you mention are great! 💻\n\n\
                Select them in the language list and I can give you more precise advice!"
            .to_string();
    }
    let shown: Vec<&str> = languages.iter().take(3).copied().collect();
    format!(
        "Excellent choice with {}! 🐍\n\n\
         For these languages I particularly recommend:\n\
         • 📚 Automatic API documentation\n\
         • 🔒 A thorough security scan\n\
         • 🔧 Performance optimisation\n\n\
         Do you have specific frameworks in mind?",
        shown.join(", ")
    )
}
