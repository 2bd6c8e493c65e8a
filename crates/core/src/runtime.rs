//! Async driver: feeds commands into a [`Shell`] and fires its timers on a real clock.

use crate::shell::{Command, Shell, ShellEvent};
use crewflow_scheduler::Clock;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Upper bound on how long the loop sleeps when no timer is pending.
const IDLE_WAKE: Duration = Duration::from_secs(3600);

/// Run until the command channel closes. Every event the shell produces is handed to
/// `on_event` together with a view of the shell at that moment.
pub async fn run_session<C, F>(
    shell: &mut Shell,
    clock: &C,
    mut commands: mpsc::Receiver<Command>,
    mut on_event: F,
) where
    C: Clock,
    F: FnMut(&Shell, ShellEvent),
{
    tracing::info!("Session loop started");
    loop {
        for event in shell.drain_events() {
            on_event(shell, event);
        }

        let wake = match shell.next_deadline() {
            Some(deadline) => clock.instant_at(deadline),
            None => Instant::now() + IDLE_WAKE,
        };

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                shell.advance_to(clock.elapsed());
                if let Err(error) = shell.apply(command) {
                    tracing::warn!("Command rejected: {}", error);
                    on_event(shell, ShellEvent::Error { message: error.to_string() });
                }
            }
            _ = tokio::time::sleep_until(wake) => {
                shell.advance_to(clock.elapsed());
            }
        }
    }

    for event in shell.drain_events() {
        on_event(shell, event);
    }
    tracing::info!("Session loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::EngineConfig;
    use crate::progress::RunStatus;
    use crewflow_scheduler::TokioClock;

    fn shell() -> Shell {
        let config = EngineConfig {
            seed: Some(3),
            ..EngineConfig::default()
        };
        Shell::new(config, Catalog::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_fires_timers_between_commands() {
        let mut shell = shell();
        let clock = TokioClock::start();
        let (tx, rx) = mpsc::channel(8);

        tokio::spawn(async move {
            tx.send(Command::StartAnalysis).await.unwrap();
            tokio::time::sleep(Duration::from_secs(40)).await;
            tx.send(Command::Summarize).await.unwrap();
        });

        let mut events = Vec::new();
        run_session(&mut shell, &clock, rx, |_, event| events.push(event)).await;

        assert_eq!(shell.progress().state().status(), RunStatus::Complete);
        assert!(events
            .iter()
            .any(|event| matches!(event, ShellEvent::AnalysisComplete { .. })));
        assert!(matches!(events.last(), Some(ShellEvent::Summary { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_command_reported_as_event() {
        let mut shell = shell();
        let clock = TokioClock::start();
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::CancelAnalysis).await.unwrap();
        drop(tx);

        let mut errors = Vec::new();
        run_session(&mut shell, &clock, rx, |_, event| {
            if let ShellEvent::Error { message } = event {
                errors.push(message);
            }
        })
        .await;

        assert_eq!(errors, vec!["Cannot cancel while the analysis is idle".to_string()]);
    }
}
