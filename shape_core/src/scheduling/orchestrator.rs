use super::frame_rate::FrameRateMeter;
use super::metrics::{OrchestratorMetrics, OrchestratorSnapshot};
use crate::backend::{ActuatorBackend, DisplayKind};
use crate::config::{ErrorPolicy, ShapeConfig, TuningConfig, DEFAULT_FRAME_RATE_HZ};
use crate::core::{
    Application, ApplicationRegistry, Clock, GraphicsBuffer, GridSize, HeightField,
    HeightFieldReader, InputEvent, Key, PinConfigGrid, ReservedAction, ReservedKeys,
    SensorSource, SharedHeightField, SystemClock, Timestamp,
};
use crate::error::{ShapeError, ShapeResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_OVERLAY_SIZE: (usize, usize) = (300, 300);

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Sequence number, starting at 1
    pub tick: u64,
    pub timestamp: Timestamp,
    pub paused: bool,
    /// Seconds the application was advanced by (0 when paused or at startup)
    pub elapsed: f64,
    /// Measured heights were pulled from the backend
    pub readback: bool,
    /// Tuning was pushed to the backend
    pub tuning_pushed: bool,
}

/// Clonable flag that ends the run loop
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Assembles an [`Orchestrator`] and performs startup
pub struct OrchestratorBuilder {
    name: String,
    grid: GridSize,
    clock: Option<Arc<dyn Clock>>,
    sensor: Option<Box<dyn SensorSource>>,
    backend: Option<Box<dyn ActuatorBackend>>,
    registry: ApplicationRegistry,
    registration_error: Option<ShapeError>,
    default_application: Option<String>,
    tuning: TuningConfig,
    frame_rate_hz: f64,
    error_policy: ErrorPolicy,
    overlay_size: (usize, usize),
}

impl OrchestratorBuilder {
    pub fn new(grid: GridSize) -> Self {
        Self {
            name: "ShapeDisplay".to_string(),
            grid,
            clock: None,
            sensor: None,
            backend: None,
            registry: ApplicationRegistry::new(),
            registration_error: None,
            default_application: None,
            tuning: TuningConfig::default(),
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            error_policy: ErrorPolicy::Skip,
            overlay_size: DEFAULT_OVERLAY_SIZE,
        }
    }

    /// Apply tuning, timing, error policy and default application from a config
    pub fn with_config(mut self, config: &ShapeConfig) -> Self {
        self.tuning = config.tuning;
        self.frame_rate_hz = config.timing.frame_rate_hz;
        self.error_policy = config.error_policy;
        self.default_application = Some(config.application.default.clone());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_tuning(mut self, tuning: TuningConfig) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate_hz: f64) -> Self {
        self.frame_rate_hz = frame_rate_hz;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_overlay_size(mut self, width: usize, height: usize) -> Self {
        self.overlay_size = (width, height);
        self
    }

    pub fn sensor(mut self, sensor: Box<dyn SensorSource>) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn backend(mut self, backend: Box<dyn ActuatorBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Register an application under a unique name
    pub fn application(mut self, name: &str, application: Box<dyn Application>) -> Self {
        if let Err(err) = self.registry.register(name, application) {
            self.registration_error.get_or_insert(err);
        }
        self
    }

    /// Application that is current after startup (defaults to the first registered)
    pub fn default_application(mut self, name: &str) -> Self {
        self.default_application = Some(name.to_string());
        self
    }

    /// Validate, apply the default tuning globally, bind read-back, select the default application
    pub fn build(self) -> ShapeResult<Orchestrator> {
        let OrchestratorBuilder {
            name,
            grid,
            clock,
            sensor,
            backend,
            mut registry,
            registration_error,
            default_application,
            tuning,
            frame_rate_hz,
            error_policy,
            overlay_size,
        } = self;

        let mut sensor = sensor.ok_or_else(|| ShapeError::config("no sensor source configured"))?;
        let mut backend = match backend {
            Some(backend) => backend,
            None => {
                release(None, Some(&mut sensor));
                return Err(ShapeError::config("no actuator backend configured"));
            }
        };

        let prepared = (|| -> ShapeResult<()> {
            if let Some(err) = registration_error {
                return Err(err);
            }
            if !(frame_rate_hz.is_finite() && frame_rate_hz > 0.0) {
                return Err(ShapeError::config(format!(
                    "frame rate must be positive, got {}",
                    frame_rate_hz
                )));
            }
            grid.ensure_matches(backend.grid_size())?;
            if registry.is_empty() {
                return Err(ShapeError::config("no applications registered"));
            }
            if let Some(default) = default_application.as_deref() {
                registry.select(default)?;
            }
            Ok(())
        })();
        if let Err(err) = prepared {
            release(Some(&mut backend), Some(&mut sensor));
            return Err(err);
        }

        let clock: Arc<dyn Clock> = match clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let now = clock.now();

        let default_tuning = tuning.to_pin_config(now);
        if let Err(err) = backend.set_global_tuning(&default_tuning) {
            release(Some(&mut backend), Some(&mut sensor));
            return Err(err);
        }

        let kind = backend.display();
        let readback_supported = backend.readback_supported();
        let actual = SharedHeightField::zeroed(grid);
        if readback_supported {
            registry.bind_readback_all(&actual.reader());
        }

        info!(
            "{} started: {} display ({}), {} application(s), current '{}'",
            name,
            kind.label(),
            grid,
            registry.len(),
            registry.current_name().unwrap_or("-"),
        );

        Ok(Orchestrator {
            name,
            grid,
            display: kind,
            clock,
            sensor: Some(sensor),
            backend: Some(backend),
            readback_supported,
            registry,
            desired: HeightField::zeroed(grid),
            actual,
            tuning: PinConfigGrid::uniform(grid, default_tuning),
            graphics: GraphicsBuffer::new(overlay_size.0, overlay_size.1),
            paused: false,
            tuning_last_pushed: now,
            frame_rate: FrameRateMeter::default(),
            target_rate_hz: frame_rate_hz,
            error_policy,
            reserved_keys: ReservedKeys::default(),
            metrics: OrchestratorMetrics::default(),
            running: Arc::new(AtomicBool::new(true)),
            tick_count: 0,
        })
    }
}

/// Release hardware in shutdown order, logging failures
fn release(
    backend: Option<&mut Box<dyn ActuatorBackend>>,
    sensor: Option<&mut Box<dyn SensorSource>>,
) {
    if let Some(backend) = backend {
        if let Err(err) = backend.shutdown() {
            warn!("Failed to shut down {} backend: {}", backend.display(), err);
        }
    }
    if let Some(sensor) = sensor {
        if let Err(err) = sensor.shutdown() {
            warn!("Failed to shut down sensor '{}': {}", sensor.name(), err);
        }
    }
}

/// Owns the sensor, the backend, the applications and every shared buffer,
/// and drives the per-tick synchronization between them.
pub struct Orchestrator {
    name: String,
    grid: GridSize,
    display: DisplayKind,
    clock: Arc<dyn Clock>,

    // Hardware, released exactly once by shutdown()
    sensor: Option<Box<dyn SensorSource>>,
    backend: Option<Box<dyn ActuatorBackend>>,
    readback_supported: bool,

    registry: ApplicationRegistry,

    // Buffers allocated once at startup
    desired: HeightField,
    actual: SharedHeightField,
    tuning: PinConfigGrid,
    graphics: GraphicsBuffer,

    paused: bool,
    tuning_last_pushed: Timestamp,
    frame_rate: FrameRateMeter,
    target_rate_hz: f64,
    error_policy: ErrorPolicy,
    reserved_keys: ReservedKeys,

    metrics: OrchestratorMetrics,
    running: Arc<AtomicBool>,
    tick_count: u64,
}

impl Orchestrator {
    pub fn builder(grid: GridSize) -> OrchestratorBuilder {
        OrchestratorBuilder::new(grid)
    }

    /// Run one synchronization step
    pub fn tick(&mut self) -> ShapeResult<TickReport> {
        let started = Instant::now();
        let result = self.run_tick();
        match &result {
            Ok(report) => self.metrics.record_success(
                started.elapsed(),
                report.paused,
                report.readback,
                report.tuning_pushed,
            ),
            Err(_) => self.metrics.record_failure(started.elapsed()),
        }
        self.metrics.frame_rate_hz = self.frame_rate.rate_hz();
        result
    }

    fn run_tick(&mut self) -> ShapeResult<TickReport> {
        let policy = self.error_policy;
        let (sensor, backend) = match (self.sensor.as_mut(), self.backend.as_mut()) {
            (Some(sensor), Some(backend)) => (sensor, backend),
            _ => return Err(ShapeError::ShutDown),
        };
        let application = self
            .registry
            .current_mut()
            .ok_or_else(|| ShapeError::Internal("no current application".to_string()))?;

        let now = self.clock.now();
        let frame_rate = self.frame_rate.sample(now);

        if let Err(err) = sensor.update() {
            tolerate(policy, "sensor update", err)?;
        }

        let mut readback = false;
        if self.readback_supported {
            let outcome = backend.read_heights(&mut self.actual.write());
            match outcome {
                Ok(()) => readback = true,
                Err(err) => tolerate(policy, "height read-back", err)?,
            }
        }

        // Never carried over from a previous tick
        let mut tuning_stale = false;
        let mut elapsed = 0.0;
        if !self.paused {
            if frame_rate > 0.0 {
                elapsed = 1.0 / frame_rate;
            }
            application.advance(elapsed);
            application.write_heights(&mut self.desired);

            tuning_stale = self.tuning_last_pushed < application.tuning_last_changed();
            if tuning_stale {
                application.write_tuning(&mut self.tuning);
            }
        }

        self.graphics.clear();
        application.draw_overlay(&mut self.graphics);

        backend.send_heights(&self.desired)?;

        if tuning_stale {
            backend.push_tuning(&self.tuning)?;
            debug!(
                "Pushed tuning to {} display (changed {}, last push {})",
                self.display,
                application.tuning_last_changed(),
                self.tuning_last_pushed
            );
            self.tuning_last_pushed = now;
        }

        self.tick_count += 1;
        trace!(
            tick = self.tick_count,
            paused = self.paused,
            readback,
            tuning_stale,
            "tick complete"
        );

        Ok(TickReport {
            tick: self.tick_count,
            timestamp: now,
            paused: self.paused,
            elapsed,
            readback,
            tuning_pushed: tuning_stale,
        })
    }

    /// Route an input event: reserved keys are consumed, other pressed keys go to the current application
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => self.key_pressed(key),
            other => trace!("Ignoring input event {:?}", other),
        }
    }

    pub fn key_pressed(&mut self, key: Key) {
        match self.reserved_keys.action_for(key) {
            Some(ReservedAction::TogglePause) => self.toggle_pause(),
            None => {
                if let Some(application) = self.registry.current_mut() {
                    application.on_key(key);
                }
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            debug!("{}", if paused { "Paused" } else { "Resumed" });
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Make another registered application current
    pub fn select_application(&mut self, name: &str) -> ShapeResult<()> {
        self.registry.select(name)?;
        info!("Switched to application '{}'", name);
        Ok(())
    }

    pub fn current_application_name(&self) -> Option<&str> {
        self.registry.current_name()
    }

    pub fn application_names(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.registry.current().map(|app| app.display_name())
    }

    pub fn instructions(&self) -> Option<String> {
        self.registry.current().map(|app| app.instructions())
    }

    pub fn desired_heights(&self) -> &HeightField {
        &self.desired
    }

    /// Read-only view of the measured heights (stale when read-back is unsupported)
    pub fn actual_heights(&self) -> HeightFieldReader {
        self.actual.reader()
    }

    pub fn tuning(&self) -> &PinConfigGrid {
        &self.tuning
    }

    pub fn tuning_last_pushed(&self) -> Timestamp {
        self.tuning_last_pushed
    }

    pub fn overlay(&self) -> &GraphicsBuffer {
        &self.graphics
    }

    pub fn sensor(&self) -> Option<&dyn SensorSource> {
        self.sensor.as_deref()
    }

    pub fn display(&self) -> DisplayKind {
        self.display
    }

    pub fn grid_size(&self) -> GridSize {
        self.grid
    }

    pub fn readback_supported(&self) -> bool {
        self.readback_supported
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn frame_rate(&self) -> f64 {
        self.target_rate_hz
    }

    pub fn metrics(&self) -> &OrchestratorMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            name: self.name.clone(),
            display: self.display.to_string(),
            grid: self.grid,
            readback_supported: self.readback_supported,
            paused: self.paused,
            application: self.registry.current_name().map(str::to_string),
            tuning_last_pushed_secs: self.tuning_last_pushed.as_secs(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.backend.is_none() && self.sensor.is_none()
    }

    /// Tick until stopped, then shut down
    pub fn run(&mut self) -> ShapeResult<()> {
        self.run_with(None, |_| Ok(()))
    }

    /// Tick for at most `duration`, then shut down
    pub fn run_for(&mut self, duration: Duration) -> ShapeResult<()> {
        self.run_with(Some(duration), |_| Ok(()))
    }

    /// Tick at the configured frame rate, calling `hook` before every tick
    ///
    /// The hook is where the caller delivers input and refreshes status
    /// output. Shutdown runs on every exit path.
    pub fn run_with<F>(&mut self, duration: Option<Duration>, mut hook: F) -> ShapeResult<()>
    where
        F: FnMut(&mut Orchestrator) -> ShapeResult<()>,
    {
        let result = self.run_loop(duration, &mut hook);
        if let Err(err) = &result {
            error!("{} stopped on error: {}", self.name, err);
        }
        let shutdown = self.shutdown();
        result.and(shutdown)
    }

    fn run_loop<F>(&mut self, duration: Option<Duration>, hook: &mut F) -> ShapeResult<()>
    where
        F: FnMut(&mut Orchestrator) -> ShapeResult<()>,
    {
        let period = Duration::from_secs_f64(1.0 / self.target_rate_hz);
        let start_time = Instant::now();
        info!(
            "{} running at {:.1} Hz",
            self.name, self.target_rate_hz
        );

        while self.is_running() {
            if let Some(max_duration) = duration {
                if start_time.elapsed() >= max_duration {
                    info!("{} reached time limit of {:?}", self.name, max_duration);
                    break;
                }
            }

            let frame_start = Instant::now();
            hook(self)?;
            if !self.is_running() {
                break;
            }

            if let Err(err) = self.tick() {
                match self.error_policy {
                    ErrorPolicy::Skip if err.is_io_failure() => {
                        warn!("Skipping failed tick: {}", err);
                    }
                    _ => return Err(err),
                }
            }

            let spent = frame_start.elapsed();
            if spent < period {
                std::thread::sleep(period - spent);
            }
        }

        Ok(())
    }

    /// Release the backend, then the sensor; later calls do nothing
    pub fn shutdown(&mut self) -> ShapeResult<()> {
        self.stop();
        let mut first_error = None;

        if let Some(mut backend) = self.backend.take() {
            info!("Shutting down {} display", backend.display().label());
            if let Err(err) = backend.shutdown() {
                error!("Error shutting down {} display: {}", backend.display(), err);
                first_error.get_or_insert(err);
            }
        }

        if let Some(mut sensor) = self.sensor.take() {
            info!("Shutting down sensor '{}'", sensor.name());
            if let Err(err) = sensor.shutdown() {
                error!("Error shutting down sensor '{}': {}", sensor.name(), err);
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            if let Err(err) = self.shutdown() {
                warn!("Shutdown during drop failed: {}", err);
            }
        }
    }
}

/// Apply the error policy to a sensor or read-back failure
fn tolerate(policy: ErrorPolicy, stage: &str, err: ShapeError) -> ShapeResult<()> {
    match policy {
        ErrorPolicy::Skip => {
            warn!("{} failed, continuing with previous data: {}", stage, err);
            Ok(())
        }
        ErrorPolicy::Abort => Err(err),
    }
}
