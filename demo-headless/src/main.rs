use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wind_sim_core::{
    BrushMode, ForceKind, Mode, PhysicsMode, QualityPreset, Settings, Simulation,
    SimulationConfig, StrokeEvent, Theme, Vec2,
};

/// Which gesture the demo plays back
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// A straight left-to-right gust through the middle
    Gust,
    /// A slow circular vortex brush
    Vortex,
    /// A warm stroke along the floor with buoyancy on
    Heat,
    /// An attractor and a repeller, no strokes
    Forces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Quality {
    Low,
    High,
}

/// Headless wind simulation run with flow statistics
#[derive(Parser, Debug)]
#[command(name = "wind-sim-headless")]
#[command(about = "Run the wind simulation without a renderer", long_about = None)]
struct Args {
    /// Canvas width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Requested quality tier
    #[arg(short, long, value_enum, default_value_t = Quality::High)]
    quality: Quality,

    /// Gesture to play back
    #[arg(short, long, value_enum, default_value_t = Scenario::Gust)]
    scenario: Scenario,

    /// Simulated duration in seconds
    #[arg(short, long, default_value_t = 5.0)]
    duration: f32,

    /// Display frame rate driving the fixed-step clock
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// How long the scenario stroke lasts, in seconds
    #[arg(long, default_value_t = 0.5)]
    stroke_time: f32,

    /// Visual theme (classic, ember, snow, neon)
    #[arg(short, long, default_value = "classic")]
    theme: String,

    /// Track smoke instead of particles
    #[arg(long)]
    smoke: bool,

    /// Paint a vertical wall across the middle of the canvas
    #[arg(short, long)]
    wall: bool,

    /// Report interval in seconds
    #[arg(short, long, default_value_t = 0.5)]
    report_interval: f32,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Wind Simulation Demo ===\n");

    let theme = Theme::from_name(&args.theme).unwrap_or_else(|| {
        println!("Unknown theme '{}', using classic", args.theme);
        Theme::Classic
    });
    let settings = Settings {
        mode: if args.smoke || args.scenario == Scenario::Heat {
            Mode::Smoke
        } else {
            Mode::Particles
        },
        brush: if args.scenario == Scenario::Vortex {
            BrushMode::Vortex
        } else {
            BrushMode::Push
        },
        quality: match args.quality {
            Quality::Low => QualityPreset::Low,
            Quality::High => QualityPreset::High,
        },
        physics: if args.scenario == Scenario::Heat {
            PhysicsMode::WindTemperature
        } else {
            PhysicsMode::Wind
        },
        theme,
        force_fields: args.scenario == Scenario::Forces,
        ..Settings::default()
    };

    let mut sim = match Simulation::with_settings(
        args.width,
        args.height,
        SimulationConfig::default(),
        settings,
    ) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Failed to create simulation: {err}");
            std::process::exit(1);
        }
    };

    let (world_width, world_height) = sim.world_size();
    let shape = *sim.state().shape();
    println!(
        "Created {:.0}x{:.0} world: {}x{} grid, {} particles, {:?} quality",
        world_width,
        world_height,
        shape.width,
        shape.height,
        sim.state().particles().count(),
        sim.quality()
    );
    println!("Scenario: {:?}, theme: {:?}\n", args.scenario, theme);

    if args.wall {
        let x = world_width * 0.6;
        let mut y = world_height * 0.25;
        while y < world_height * 0.75 {
            sim.paint_obstacle(x, y, 12.0, true);
            y += 8.0;
        }
        println!(
            "Painted wall: {} solid cells\n",
            sim.state().obstacles().solid_count()
        );
    }

    if args.scenario == Scenario::Forces {
        let y = world_height * 0.5;
        let strength = sim.config().force_strength;
        let radius = sim.config().force_radius;
        let left = Vec2::new(world_width * 0.3, y);
        let right = Vec2::new(world_width * 0.7, y);
        sim.add_force_source(ForceKind::Attractor, left, Vec2::x(), strength, radius);
        sim.add_force_source(ForceKind::Repeller, right, Vec2::x(), strength, radius);
    }

    let frame_time = 1.0 / args.fps.max(1.0);
    let frames = (args.duration / frame_time).ceil() as u32;
    let report_every = ((args.report_interval / frame_time).round() as u32).max(1);
    let stroke_frames = (args.stroke_time / frame_time).round() as u32;

    println!("Time(s) | Steps | Quality | Speed(px/s) | Vorticity(1/s) | Smoke    | Heat");
    println!("--------|-------|---------|-------------|----------------|----------|---------");

    let mut total_steps = 0_u64;
    for frame in 0..frames {
        if args.scenario != Scenario::Forces {
            if frame < stroke_frames {
                let event = scenario_event(
                    args.scenario,
                    frame,
                    stroke_frames,
                    world_width,
                    world_height,
                );
                if frame == 0 {
                    sim.stroke_start(&event);
                } else {
                    sim.stroke_move(&event);
                }
            } else if frame == stroke_frames {
                sim.stroke_end();
            }
        }

        let report = sim.advance_frame(frame_time);
        total_steps += u64::from(report.steps);
        if let Some(quality) = report.quality_change {
            println!("        | governor switched to {quality:?}");
        }

        if (frame + 1) % report_every == 0 || frame + 1 == frames {
            let stats = sim.flow_stats(4);
            println!(
                "{:7.2} | {:5} | {:7?} | {:11.2} | {:14.4} | {:8.3} | {:8.3}",
                sim.state().time(),
                total_steps,
                sim.quality(),
                stats.mean_speed,
                stats.mean_vorticity,
                sim.state().smoke().total(),
                sim.state().temperature().total()
            );
        }
    }

    info!(
        "Finished: {} frames, {} fixed steps, t={:.2}s",
        frames,
        total_steps,
        sim.state().time()
    );
}

/// Pointer sample for frame `frame` of a `frames`-long scenario stroke
fn scenario_event(
    scenario: Scenario,
    frame: u32,
    frames: u32,
    world_width: f32,
    world_height: f32,
) -> StrokeEvent {
    let progress = frame as f32 / frames.max(1) as f32;
    match scenario {
        Scenario::Gust | Scenario::Forces => {
            let x = world_width * (0.15 + 0.3 * progress);
            StrokeEvent::new(x, world_height * 0.5, 0.5, 0.0)
        }
        Scenario::Vortex => StrokeEvent::new(world_width * 0.5, world_height * 0.5, 0.0, 0.0),
        Scenario::Heat => {
            let x = world_width * (0.3 + 0.4 * progress);
            StrokeEvent::new(x, world_height * 0.85, 0.2, 0.0)
        }
    }
}
