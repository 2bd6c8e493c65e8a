//! Line-oriented command parsing for the interactive session.

use anyhow::{bail, Context, Result};
use crewflow_core::{Command, CrewId, QuickActionKind, Stage};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Command(Command),
    Help,
    Quit,
    Empty,
}

fn parse_switch(value: Option<&str>) -> Result<bool> {
    match value.map(str::to_lowercase).as_deref() {
        Some("on") | Some("true") | Some("yes") => Ok(true),
        Some("off") | Some("false") | Some("no") => Ok(false),
        Some(other) => bail!("Expected on/off, got '{}'", other),
        None => bail!("Missing on/off argument"),
    }
}

fn parse_crew(value: Option<&str>) -> Result<CrewId> {
    let value = value.context("Missing crew name")?;
    Ok(value.parse()?)
}

pub fn parse_line(line: &str) -> Result<ReplInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplInput::Empty);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let command = match head.to_lowercase().as_str() {
        "help" | "?" => return Ok(ReplInput::Help),
        "quit" | "exit" => return Ok(ReplInput::Quit),
        "stage" => {
            let stage: Stage = args.next().context("Missing stage name")?.parse()?;
            Command::GoToStage(stage)
        }
        "agent" => {
            let crew = parse_crew(args.next())?;
            let position: usize = args
                .next()
                .context("Missing agent number")?
                .parse()
                .context("Agent number must be a positive integer")?;
            if position == 0 {
                bail!("Agent numbers start at 1");
            }
            let active = parse_switch(args.next())?;
            Command::SetAgent {
                crew,
                index: position - 1,
                active,
            }
        }
        "crew" => {
            let crew = parse_crew(args.next())?;
            let active = parse_switch(args.next())?;
            Command::SetCrew { crew, active }
        }
        "lang" => {
            let language = args.next().context("Missing language name")?.to_string();
            let active = parse_switch(args.next())?;
            Command::SetLanguage { language, active }
        }
        "detect" => Command::DetectLanguages,
        "random" => Command::RandomizeCrews,
        "folder" => {
            if rest.is_empty() {
                bail!("Missing folder path");
            }
            Command::SetProjectFolder(PathBuf::from(rest))
        }
        "start" => Command::StartAnalysis,
        "restart" => Command::RestartAnalysis,
        "stop" => Command::CancelAnalysis,
        "scan" => Command::ScanProject,
        "quick" => match args.next().context("Missing quick action name")? {
            "cancel" => Command::CancelQuickAction,
            name => {
                let kind: QuickActionKind = name.parse()?;
                let files: Vec<String> = args.map(str::to_string).collect();
                if files.is_empty() {
                    bail!("Name at least one scanned file");
                }
                Command::QuickAction { kind, files }
            }
        },
        "action" => Command::ExecuteAction,
        "dismiss" => Command::Dismiss,
        "say" => {
            if rest.is_empty() {
                bail!("Nothing to say");
            }
            Command::Say(rest.to_string())
        }
        "status" => Command::Summarize,
        "demo" => Command::StartAutoDemo,
        other => bail!("Unknown command '{}'. Type 'help' for the list.", other),
    };
    Ok(ReplInput::Command(command))
}

pub fn help_text() -> &'static str {
    "\
Workflow
  stage <configuration|results|improvement>   Switch workflow stage
  start | restart | stop                      Run, rerun or cancel the analysis
  scan                                        Scan the project files
  quick <action> <file...> | quick cancel     Run a quick action on scanned files
    actions: comments, security, docstrings, format, bugs,
             optimize, tests, complexity, refactor
  demo                                        Automatic three-step demo
Selection
  agent <crew> <n> <on|off>                   Toggle the n-th agent of a crew
  crew <crew> <on|off>                        Toggle a whole crew
  lang <language> <on|off>                    Toggle a language
  detect | random                             Detect languages, randomize crews
  folder <path>                               Set the project folder
  crews: documentation, improvement, security, social
Assistant
  action                                      Run the suggested action
  dismiss                                     Hide the current notice
  say <text>                                  Chat with the assistant
  status                                      Session summary
  help | quit"
}
