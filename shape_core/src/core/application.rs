use super::clock::Timestamp;
use super::graphics::GraphicsBuffer;
use super::grid::{HeightField, HeightFieldReader};
use super::input::Key;
use super::pin_config::PinConfigGrid;
use crate::error::{ShapeError, ShapeResult};
use std::collections::BTreeMap;

/// A swappable display behavior
///
/// The orchestrator calls `advance` then `write_heights` on every unpaused
/// tick. Applications never own the orchestrator's buffers: heights and
/// tuning are copied into buffers passed by mutable reference, and measured
/// heights arrive through a read-only [`HeightFieldReader`].
pub trait Application: Send {
    /// Human-readable name shown to the operator
    fn display_name(&self) -> &str;

    /// Usage text (key bindings, current parameters)
    fn instructions(&self) -> String {
        String::new()
    }

    /// Integrate internal state by `elapsed` seconds (may be zero)
    fn advance(&mut self, elapsed: f64);

    /// Write the desired heights as of the latest `advance`
    fn write_heights(&self, out: &mut HeightField);

    /// When the application's tuning last changed
    ///
    /// Applications that never touch tuning keep the default, which never
    /// compares newer than a push.
    fn tuning_last_changed(&self) -> Timestamp {
        Timestamp::ZERO
    }

    /// Write the application's tuning; only called after `tuning_last_changed` moved
    fn write_tuning(&self, _out: &mut PinConfigGrid) {}

    /// Draw the projector overlay
    fn draw_overlay(&self, _surface: &mut GraphicsBuffer) {}

    /// Handle a key the orchestrator did not reserve
    fn on_key(&mut self, _key: Key) {}

    /// Receive read access to the heights measured by the display
    fn bind_readback(&mut self, _actual: HeightFieldReader) {}
}

/// Applications keyed by unique name, one of which is current
pub struct ApplicationRegistry {
    applications: BTreeMap<String, Box<dyn Application>>,
    current: Option<String>,
}

impl Default for ApplicationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self {
            applications: BTreeMap::new(),
            current: None,
        }
    }

    /// Register an application; the first one registered becomes current
    pub fn register(
        &mut self,
        name: impl Into<String>,
        application: Box<dyn Application>,
    ) -> ShapeResult<()> {
        let name = name.into();
        if self.applications.contains_key(&name) {
            return Err(ShapeError::DuplicateApplication(name));
        }
        if self.current.is_none() {
            self.current = Some(name.clone());
        }
        self.applications.insert(name, application);
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> ShapeResult<()> {
        if !self.applications.contains_key(name) {
            return Err(ShapeError::UnknownApplication(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&dyn Application> {
        let name = self.current.as_ref()?;
        self.applications.get(name).map(|app| app.as_ref())
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn Application + 'static)> {
        let name = self.current.as_ref()?;
        self.applications.get_mut(name).map(|app| app.as_mut())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Application> {
        self.applications.get(name).map(|app| app.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.applications.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    /// Hand every registered application a read-only view of measured heights
    pub fn bind_readback_all(&mut self, actual: &HeightFieldReader) {
        for application in self.applications.values_mut() {
            application.bind_readback(actual.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat {
        label: &'static str,
        height: u8,
    }

    impl Application for Flat {
        fn display_name(&self) -> &str {
            self.label
        }

        fn advance(&mut self, _elapsed: f64) {}

        fn write_heights(&self, out: &mut HeightField) {
            out.fill(self.height);
        }
    }

    fn flat(label: &'static str, height: u8) -> Box<dyn Application> {
        Box::new(Flat { label, height })
    }

    #[test]
    fn test_first_registered_is_current() {
        let mut registry = ApplicationRegistry::new();
        registry.register("low", flat("Low", 10)).unwrap();
        registry.register("high", flat("High", 200)).unwrap();

        assert_eq!(registry.current_name(), Some("low"));
        assert_eq!(registry.current().unwrap().display_name(), "Low");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = ApplicationRegistry::new();
        registry.register("demo", flat("A", 1)).unwrap();
        let err = registry.register("demo", flat("B", 2)).unwrap_err();
        assert!(matches!(err, ShapeError::DuplicateApplication(name) if name == "demo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_unknown_keeps_current() {
        let mut registry = ApplicationRegistry::new();
        registry.register("demo", flat("Demo", 1)).unwrap();

        assert!(registry.select("missing").is_err());
        assert_eq!(registry.current_name(), Some("demo"));
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = ApplicationRegistry::new();
        registry.register("wave", flat("W", 1)).unwrap();
        registry.register("echo", flat("E", 1)).unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["echo", "wave"]);
    }
}
