//! `shapedisplay run`: build the orchestrator and drive it until stopped

use crate::keyboard::{KeyboardInput, TerminalCommand};
use anyhow::{bail, Context, Result};
use colored::*;
use shape_core::scheduling::OrchestratorSnapshot;
use shape_core::{
    Clock, DisplayKind, InputEvent, Orchestrator, ShapeConfig, ShapeResult, SystemClock,
    Timestamp,
};
use shape_library::backends::SharedFirmware;
use shape_library::{create_backend, default_applications, BackendHandle, SyntheticDepthCamera};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    /// Overrides `SHAPE_DISPLAY` and the config file
    pub display: Option<String>,
    pub app: Option<String>,
    /// Seconds to run before stopping on its own
    pub duration: Option<f64>,
    pub keyboard: bool,
    /// Seconds between status lines, 0 to disable
    pub status_interval: f64,
    pub seed: u64,
}

/// Display precedence: command line, then environment, then config file
pub fn resolve_display(config: &ShapeConfig, cli: Option<&str>) -> ShapeResult<DisplayKind> {
    match cli {
        Some(name) => name.parse(),
        None => config.display_kind(),
    }
}

/// Load the config file and fold in the command line overrides
pub fn prepare_config(options: &RunOptions) -> Result<(ShapeConfig, DisplayKind)> {
    let mut config = ShapeConfig::discover(options.config.as_deref())
        .context("Failed to load configuration")?;
    let kind = resolve_display(&config, options.display.as_deref())?;
    config.display.kind = kind.as_str().to_string();
    if let Some(app) = &options.app {
        config.application.default = app.clone();
    }
    config.validate()?;
    Ok((config, kind))
}

fn seconds(value: f64, what: &str) -> Result<Duration> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be a positive number of seconds, got {}", what, value);
    }
    Ok(Duration::from_secs_f64(value))
}

/// Wire backend, camera and the bundled applications together
///
/// Returns the simulated firmware too when the display is simulated.
pub fn build_orchestrator(
    config: &ShapeConfig,
    kind: DisplayKind,
    seed: u64,
) -> Result<(Orchestrator, Option<SharedFirmware>)> {
    let frame_rate = config.timing.frame_rate_hz;
    let BackendHandle { backend, firmware } = create_backend(kind, &config.display, frame_rate)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let mut builder = Orchestrator::builder(kind.grid_size())
        .with_name("shapedisplay")
        .with_config(config)
        .with_clock(clock.clone())
        .sensor(Box::new(SyntheticDepthCamera::new(seed, frame_rate)))
        .backend(backend);
    let tuning = config.tuning.to_pin_config(Timestamp::ZERO);
    for (name, application) in default_applications(clock, tuning) {
        builder = builder.application(name, application);
    }
    Ok((builder.build()?, firmware))
}

pub fn execute_run(options: RunOptions) -> Result<()> {
    let (config, kind) = prepare_config(&options)?;
    let duration = options
        .duration
        .map(|secs| seconds(secs, "--duration"))
        .transpose()?;
    let status_every = if options.status_interval > 0.0 {
        Some(seconds(options.status_interval, "--status-interval")?)
    } else {
        None
    };

    let (mut orchestrator, firmware) = build_orchestrator(&config, kind, options.seed)?;
    print_banner(&orchestrator, &config);

    let stop = orchestrator.stop_handle();
    ctrlc::set_handler(move || stop.stop()).context("Failed to install Ctrl+C handler")?;

    let mut keyboard = if options.keyboard {
        KeyboardInput::open().context("Failed to read the keyboard")?
    } else {
        None
    };
    let raw = keyboard.is_some();
    let mut last_status = Instant::now();

    let result = orchestrator.run_with(duration, |orchestrator| {
        if let Some(keyboard) = keyboard.as_mut() {
            for command in keyboard.poll()? {
                apply_command(orchestrator, command, raw)?;
            }
        }
        if let Some(every) = status_every {
            if last_status.elapsed() >= every {
                print_line(&status_line(&orchestrator.snapshot()), raw);
                last_status = Instant::now();
            }
        }
        Ok(())
    });
    // Leave raw mode before anything else is printed
    drop(keyboard);
    result?;

    info!("Run finished");
    println!("{}", "Final metrics".cyan().bold());
    println!("{}", serde_json::to_string_pretty(&orchestrator.snapshot())?);
    if let Some(firmware) = firmware {
        let stats = firmware.lock().stats();
        println!("{}", "Simulated boards".cyan().bold());
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

/// Route one terminal command to the orchestrator
pub fn apply_command(
    orchestrator: &mut Orchestrator,
    command: TerminalCommand,
    raw: bool,
) -> ShapeResult<()> {
    match command {
        TerminalCommand::Key(key) => {
            let was_paused = orchestrator.is_paused();
            orchestrator.handle_input(InputEvent::KeyPressed(key));
            if orchestrator.is_paused() != was_paused {
                let state = if orchestrator.is_paused() {
                    "paused".yellow()
                } else {
                    "running".green()
                };
                print_line(&format!("{} {}", "→".cyan(), state), raw);
            }
        }
        TerminalCommand::Resized { width, height } => {
            orchestrator.handle_input(InputEvent::Resized {
                width: width as u32,
                height: height as u32,
            });
        }
        TerminalCommand::SelectApplication(index) => {
            let Some(name) = orchestrator.application_names().into_iter().nth(index) else {
                return Ok(());
            };
            orchestrator.select_application(&name)?;
            print_application(orchestrator, raw);
        }
        TerminalCommand::Quit => orchestrator.stop(),
    }
    Ok(())
}

pub fn status_line(snapshot: &OrchestratorSnapshot) -> String {
    let state = if snapshot.paused { "paused" } else { "running" };
    format!(
        "[{}] {} | app {} | {:.1} Hz | ticks {} ok / {} failed | tuning pushes {}",
        snapshot.display,
        state,
        snapshot.application.as_deref().unwrap_or("-"),
        snapshot.metrics.frame_rate_hz,
        snapshot.metrics.successful_ticks,
        snapshot.metrics.failed_ticks,
        snapshot.metrics.tuning_pushes,
    )
}

// Raw mode does not return the carriage on a newline
fn print_line(line: &str, raw: bool) {
    if raw {
        print!("{}\r\n", line);
    } else {
        println!("{}", line);
    }
}

fn print_banner(orchestrator: &Orchestrator, config: &ShapeConfig) {
    let kind = orchestrator.display();
    let grid = orchestrator.grid_size();
    println!("{}", "Shape display".cyan().bold());
    println!("  {} {}", "Display:".dimmed(), kind.label().bold());
    println!("  {} {}x{}", "Grid:".dimmed(), grid.x, grid.y);
    println!(
        "  {} {}",
        "Read-back:".dimmed(),
        if orchestrator.readback_supported() {
            "yes".green()
        } else {
            "no".yellow()
        }
    );
    println!(
        "  {} {:?} at {} Hz",
        "Transport:".dimmed(),
        config.display.transport,
        config.timing.frame_rate_hz
    );
    println!(
        "  {} {}",
        "Applications:".dimmed(),
        orchestrator.application_names().join(", ")
    );
    println!(
        "  {} space pause, F1-F12 switch application, Esc quit",
        "Keys:".dimmed()
    );
    print_application(orchestrator, false);
}

fn print_application(orchestrator: &Orchestrator, raw: bool) {
    let name = orchestrator.display_name().unwrap_or("-");
    print_line(&format!("{} {}", "→".cyan(), name.bold()), raw);
    for line in orchestrator.instructions().unwrap_or_default().lines() {
        print_line(&format!("    {}", line.dimmed()), raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_core::{Key, ShapeError};
    use std::io::Write;

    fn options_with(config: &str, extension: &str) -> (tempfile::NamedTempFile, RunOptions) {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(config.as_bytes()).unwrap();
        let options = RunOptions {
            config: Some(file.path().to_path_buf()),
            ..RunOptions::default()
        };
        (file, options)
    }

    #[test]
    fn test_cli_display_wins() {
        let config = ShapeConfig::default();
        assert_eq!(
            resolve_display(&config, Some("transform")).unwrap(),
            DisplayKind::Transform
        );
        let err = resolve_display(&config, Some("pinscreen")).unwrap_err();
        assert!(matches!(err, ShapeError::UnknownDisplay(_)));
    }

    #[test]
    fn test_overrides_applied() {
        let (_file, mut options) = options_with(
            "[display]\nkind = \"inform\"\n[application]\ndefault = \"demo\"\n",
            ".toml",
        );
        options.display = Some("cooperform".to_string());
        options.app = Some("echo".to_string());

        let (config, kind) = prepare_config(&options).unwrap();
        assert_eq!(kind, DisplayKind::Cooperform);
        assert_eq!(config.display.kind, "cooperform");
        assert_eq!(config.application.default, "echo");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (_file, mut options) = options_with("timing:\n  frame_rate_hz: 0.0\n", ".yaml");
        options.display = Some("inform".to_string());
        assert!(prepare_config(&options).is_err());
    }

    #[test]
    fn test_seconds_must_be_positive() {
        assert!(seconds(0.0, "--duration").is_err());
        assert!(seconds(f64::NAN, "--duration").is_err());
        assert_eq!(seconds(1.5, "--duration").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_commands_reach_orchestrator() {
        let config = ShapeConfig::default();
        let (mut orchestrator, firmware) =
            build_orchestrator(&config, DisplayKind::Transform, 1).unwrap();
        assert!(firmware.is_some());
        assert_eq!(orchestrator.current_application_name(), Some("demo"));

        apply_command(&mut orchestrator, TerminalCommand::Key(Key::Char(' ')), false).unwrap();
        assert!(orchestrator.is_paused());

        apply_command(&mut orchestrator, TerminalCommand::SelectApplication(1), false).unwrap();
        assert_eq!(orchestrator.current_application_name(), Some("echo"));
        // Out of range selections are ignored
        apply_command(&mut orchestrator, TerminalCommand::SelectApplication(7), false).unwrap();
        assert_eq!(orchestrator.current_application_name(), Some("echo"));

        orchestrator.tick().unwrap();
        let line = status_line(&orchestrator.snapshot());
        assert!(line.contains("[transform] paused"));
        assert!(line.contains("app echo"));

        apply_command(&mut orchestrator, TerminalCommand::Quit, false).unwrap();
        assert!(!orchestrator.is_running());
        orchestrator.shutdown().unwrap();
    }
}
