//! Tick path benchmarks
//!
//! Measures one orchestrator tick against in-memory collaborators, for each
//! display grid and with a tuning push on every tick.
//!
//! Run with: cargo bench --bench tick_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shape_core::{
    ActuatorBackend, Application, Clock, DepthFrame, DisplayKind, GridSize, HeightField,
    ManualClock, Orchestrator, PinConfig, PinConfigGrid, SensorSource, ShapeResult, Timestamp,
};
use std::sync::Arc;

struct NullBackend {
    display: DisplayKind,
    checksum: u64,
}

impl ActuatorBackend for NullBackend {
    fn display(&self) -> DisplayKind {
        self.display
    }

    fn readback_supported(&self) -> bool {
        self.display.readback_supported()
    }

    fn send_heights(&mut self, heights: &HeightField) -> ShapeResult<()> {
        self.checksum = heights.as_slice().iter().map(|&h| h as u64).sum();
        Ok(())
    }

    fn read_heights(&mut self, out: &mut HeightField) -> ShapeResult<()> {
        out.fill((self.checksum % 256) as u8);
        Ok(())
    }

    fn set_global_tuning(&mut self, _config: &PinConfig) -> ShapeResult<()> {
        Ok(())
    }

    fn push_tuning(&mut self, configs: &PinConfigGrid) -> ShapeResult<()> {
        black_box(configs.as_slice());
        Ok(())
    }
}

struct StillCamera {
    frame: DepthFrame,
}

impl SensorSource for StillCamera {
    fn name(&self) -> &str {
        "still"
    }

    fn update(&mut self) -> ShapeResult<()> {
        self.frame.begin_frame();
        Ok(())
    }

    fn depth_frame(&self) -> &DepthFrame {
        &self.frame
    }
}

/// Diagonal ramp whose tuning is restamped from the clock when `retune` is set
struct Ramp {
    phase: f64,
    clock: Arc<ManualClock>,
    retune: bool,
}

impl Application for Ramp {
    fn display_name(&self) -> &str {
        "Ramp"
    }

    fn advance(&mut self, elapsed: f64) {
        self.phase += elapsed;
    }

    fn write_heights(&self, out: &mut HeightField) {
        let offset = (self.phase * 100.0) as usize;
        let size = out.size();
        for y in 0..size.y {
            for (x, height) in out.row_mut(y).iter_mut().enumerate() {
                *height = ((x + y + offset) % 256) as u8;
            }
        }
    }

    fn tuning_last_changed(&self) -> Timestamp {
        if self.retune {
            self.clock.now()
        } else {
            Timestamp::ZERO
        }
    }

    fn write_tuning(&self, out: &mut PinConfigGrid) {
        out.fill(PinConfig::default().stamped(self.clock.now()));
    }
}

fn orchestrator(display: DisplayKind, retune: bool) -> (Orchestrator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0.0));
    let ramp = Ramp {
        phase: 0.0,
        clock: clock.clone(),
        retune,
    };
    let orchestrator = Orchestrator::builder(display.grid_size())
        .with_clock(clock.clone())
        .sensor(Box::new(StillCamera {
            frame: DepthFrame::default(),
        }))
        .backend(Box::new(NullBackend {
            display,
            checksum: 0,
        }))
        .application("ramp", Box::new(ramp))
        .build()
        .unwrap();
    (orchestrator, clock)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for display in DisplayKind::ALL {
        group.bench_with_input(
            BenchmarkId::new("heights_only", display.as_str()),
            &display,
            |b, &display| {
                let (mut orchestrator, clock) = orchestrator(display, false);
                b.iter(|| {
                    clock.advance(1.0 / 30.0);
                    black_box(orchestrator.tick().unwrap());
                });
            },
        );
    }

    group.bench_function("tuning_push_every_tick", |b| {
        let (mut orchestrator, clock) = orchestrator(DisplayKind::Inform, true);
        b.iter(|| {
            clock.advance(1.0 / 30.0);
            black_box(orchestrator.tick().unwrap());
        });
    });

    group.finish();
}

fn bench_paused_tick(c: &mut Criterion) {
    c.bench_function("paused_tick", |b| {
        let (mut orchestrator, clock) = orchestrator(DisplayKind::Transform, false);
        orchestrator.set_paused(true);
        b.iter(|| {
            clock.advance(1.0 / 30.0);
            black_box(orchestrator.tick().unwrap());
        });
    });
}

criterion_group!(benches, bench_tick, bench_paused_tick);
criterion_main!(benches);
