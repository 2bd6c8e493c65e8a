use anyhow::{Context, Result};
use crewflow_app::config::AppConfig;
use crewflow_app::render::render_event;
use crewflow_app::repl::{help_text, parse_line, ReplInput};
use crewflow_core::{run_session, Command, Shell};
use crewflow_scheduler::TokioClock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.log_level);

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              Crewflow Workflow Shell                             ║");
    println!("║  Type 'help' for commands, 'quit' to leave                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let catalog = config.catalog()?;
    let mut shell =
        Shell::new(config.engine.clone(), catalog).context("Failed to start the workflow shell")?;

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(read_commands(tx));

    let clock = TokioClock::start();
    let format = config.event_format;
    run_session(&mut shell, &clock, rx, |shell, event| {
        if let Some(line) = render_event(shell, &event, format) {
            println!("{}", line);
        }
    })
    .await;

    println!("👋 Goodbye!");
    Ok(())
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Forward parsed stdin lines to the session until EOF or `quit`.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                break;
            }
        };

        match parse_line(&line) {
            Ok(ReplInput::Command(command)) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Ok(ReplInput::Help) => println!("{}", help_text()),
            Ok(ReplInput::Quit) => break,
            Ok(ReplInput::Empty) => {}
            Err(e) => eprintln!("❌ {}", e),
        }
    }
}
