//! Applications shipped with the runtime
//!
//! - **demo** ([`TunableWaveApp`]): travelling wave with keyboard-adjustable shape and tuning
//! - **echo** ([`EchoApp`]): holds the shape the pins are pressed into

pub mod echo;
pub mod tunable_wave;

pub use echo::EchoApp;
pub use tunable_wave::TunableWaveApp;

use shape_core::{Application, Clock, PinConfig};
use std::sync::Arc;

/// Every bundled application, keyed by registry name
///
/// `tuning` should match what the orchestrator applies at startup so that the
/// first retune adjusts the configured values.
pub fn default_applications(
    clock: Arc<dyn Clock>,
    tuning: PinConfig,
) -> Vec<(&'static str, Box<dyn Application>)> {
    vec![
        (
            TunableWaveApp::NAME,
            Box::new(TunableWaveApp::new(clock.clone(), tuning)) as Box<dyn Application>,
        ),
        (EchoApp::NAME, Box::new(EchoApp::new(clock, tuning))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_core::SystemClock;

    #[test]
    fn test_default_applications_have_unique_names() {
        let apps = default_applications(Arc::new(SystemClock::new()), PinConfig::default());
        let names: Vec<&str> = apps.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["demo", "echo"]);
        assert_eq!(apps[0].1.display_name(), "Tunable Wave");
        assert!(!apps[1].1.instructions().is_empty());
    }
}
