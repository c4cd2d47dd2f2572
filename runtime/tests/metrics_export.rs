//! Store metrics as rendered by the Prometheus exporter.
//!
//! Lives in its own test binary: the exporter installs a process-wide recorder.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use eventure_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use eventure_runtime::Store;
use eventure_runtime::metrics::MetricsExporter;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum TallyAction {
    Add,
    Added,
}

#[derive(Clone)]
struct TallyReducer;

impl Reducer for TallyReducer {
    type State = u32;
    type Action = TallyAction;
    type Environment = ();

    fn reduce(&self, state: &mut u32, action: TallyAction, _env: &()) -> SmallVec<[Effect<TallyAction>; 4]> {
        match action {
            TallyAction::Add => smallvec![Effect::future(async { Some(TallyAction::Added) })],
            TallyAction::Added => {
                *state += 1;
                SmallVec::new()
            },
        }
    }
}

#[tokio::test]
async fn store_activity_shows_up_in_the_rendered_metrics() {
    let mut exporter = MetricsExporter::new();
    exporter.install().expect("install exporter");

    let store = Store::new(0_u32, TallyReducer, ());
    store.send(TallyAction::Add).await.unwrap();
    store.settle(Duration::from_secs(1)).await.unwrap();
    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.state(|s| *s).await, 1);

    let body = exporter.render().expect("exporter is installed");
    assert!(body.contains("store_commands_total"), "{body}");
    assert!(body.contains("store_effects_executed"), "{body}");
    assert!(body.contains("store_reducer_duration_seconds"), "{body}");
    assert!(body.contains("store_shutdown_completed"), "{body}");
}
