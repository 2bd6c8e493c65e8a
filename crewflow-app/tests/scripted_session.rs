#![allow(clippy::unwrap_used)]

use crewflow_app::config::{AppConfig, EventFormat};
use crewflow_app::render::render_event;
use crewflow_app::repl::{parse_line, ReplInput};
use crewflow_core::{run_session, Catalog, Shell};
use crewflow_scheduler::TokioClock;
use std::time::Duration;
use tokio::sync::mpsc;

const SCRIPT: &str = "
lang python on
lang rust on
lang go on
lang java on
action
say any suggestions?
start
";

#[tokio::test(start_paused = true)]
async fn test_scripted_session_output() {
    let mut config = AppConfig::default();
    config.engine.seed = Some(21);
    let mut shell = Shell::new(config.engine.clone(), Catalog::default()).unwrap();

    let commands: Vec<_> = SCRIPT
        .lines()
        .filter_map(|line| match parse_line(line).unwrap() {
            ReplInput::Command(command) => Some(command),
            _ => None,
        })
        .collect();
    assert_eq!(commands.len(), 7);

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        for command in commands {
            tx.send(command).await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let clock = TokioClock::start();
    let mut output = Vec::new();
    run_session(&mut shell, &clock, rx, |shell, event| {
        if let Some(line) = render_event(shell, &event, EventFormat::Json) {
            output.push(line);
        }
    })
    .await;

    let events: Vec<serde_json::Value> = output
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|event| event["event"].as_str())
        .collect();

    assert!(kinds.contains(&"assistant"));
    assert!(kinds.contains(&"stage_changed"));
    assert!(kinds.contains(&"analysis_complete"));
    assert!(events.iter().any(|event| event["notice"]["text"]
        .as_str()
        .is_some_and(|text| text.contains("Multi-language project"))));
}
