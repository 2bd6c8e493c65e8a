#![allow(clippy::unwrap_used)]

use crewflow_core::config::ProgressConfig;
use crewflow_core::progress::interpolate;
use crewflow_core::*;
use crewflow_scheduler::TimerQueue;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;

const CREWS: [CrewId; 4] = [
    CrewId::Documentation,
    CrewId::CodeImprovement,
    CrewId::Security,
    CrewId::SocialContent,
];

proptest! {
    #[test]
    fn progress_rises_until_complete(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut selection = SelectionModel::new(Catalog::default()).unwrap();
        selection.randomize_crews(&mut rng);
        selection.detect_languages(&mut rng, false);

        let plan = AnalysisPlan::generate(&selection, &mut rng);
        let finals = plan.metrics.clone();
        let mut timers = TimerQueue::new();
        let mut simulator = ProgressSimulator::new(ProgressConfig::default());
        simulator.start(plan, &mut timers, &mut rng).unwrap();

        let mut last = 0;
        let mut shown: BTreeMap<MetricId, u64> = BTreeMap::new();
        let mut completed = None;
        while let Some(TimerEvent::ProgressTick { run }) = timers.pop_due(Duration::from_secs(120)) {
            match simulator.tick(run, &mut timers, &mut rng) {
                TickOutcome::Advanced { value, .. } => {
                    prop_assert!(value > last && value < 100);
                    last = value;
                    for (metric, final_value) in &finals {
                        if let Some(MetricValue::Number(current)) = simulator.state().metrics().get(metric) {
                            prop_assert!(current <= final_value);
                            let previous = shown.insert(*metric, *current).unwrap_or(0);
                            prop_assert!(previous <= *current);
                        }
                    }
                }
                TickOutcome::Completed(summary) => completed = Some(summary),
                TickOutcome::Stale => {
                    return Err(TestCaseError::fail("tick for the live run was treated as stale"));
                }
            }
        }

        let summary = completed.unwrap();
        prop_assert_eq!(summary.run, 1);
        prop_assert_eq!(simulator.state().value(), 100);
        prop_assert_eq!(simulator.state().status(), RunStatus::Complete);
        prop_assert_eq!(simulator.artifacts().len(), summary.generated_files);
        for (metric, final_value) in &finals {
            prop_assert_eq!(
                simulator.state().metrics().get(metric),
                Some(&MetricValue::Number(*final_value))
            );
        }
    }

    #[test]
    fn interpolation_never_decreases(
        final_value in 0u64..1_000_000_000_000,
        a in 0u8..=100,
        b in 0u8..=100,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let at_low = interpolate(final_value, low);
        let at_high = interpolate(final_value, high);
        prop_assert!(at_low <= at_high);
        prop_assert!(at_high <= final_value);
        prop_assert_eq!(interpolate(final_value, 100), final_value);
    }

    #[test]
    fn accepted_reactions_are_a_cooldown_apart(gaps in proptest::collection::vec(0u64..2_500, 1..25)) {
        let config = EngineConfig { seed: Some(11), ..EngineConfig::default() };
        let mut shell = Shell::new(config, Catalog::default()).unwrap();
        let mut accepted = Vec::new();

        for (i, gap) in gaps.iter().enumerate() {
            shell.advance(Duration::from_millis(*gap));
            let suppressed = shell.metrics().reactions_suppressed;
            shell
                .apply(Command::SetAgent { crew: CREWS[i % 4], index: i % 3, active: i % 2 == 0 })
                .unwrap();
            if shell.metrics().reactions_suppressed == suppressed {
                accepted.push(shell.now());
            }
        }

        for pair in accepted.windows(2) {
            prop_assert!(pair[1] - pair[0] >= Duration::from_secs(3));
        }

        shell.advance(Duration::from_secs(2));
        let reactions = shell
            .drain_events()
            .iter()
            .filter(|event| matches!(event, ShellEvent::Assistant { .. }))
            .count();
        prop_assert_eq!(reactions, accepted.len());
    }
}
