use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use glam::{Quat, Vec2, Vec3};
use locomotion_common::{AnchorId, HandId, RigPose, Transform};
use locomotion_core::{
    ClimbAnchor, Dependencies, FrameInput, GroundPlane, HandFrameInput, LocomotionConfig,
    LocomotionCoordinator, ModeKind, RigSetup,
};
use locomotion_input::DeviceSample;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "locomotion-cli", about = "Headless driver for the locomotion core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a YAML config and report whether it is valid
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
    /// Print the default config as YAML
    DefaultConfig,
    /// Run a scripted scenario for one mode and print the resulting rig pose
    Simulate {
        /// Mode to exercise
        #[arg(value_enum)]
        mode: Scenario,
        /// Optional YAML config; defaults are used otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u32,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    Teleport,
    Armswing,
    Fly,
    Navigate,
    Climb,
}

impl Scenario {
    fn mode(self) -> ModeKind {
        match self {
            Self::Teleport => ModeKind::Teleport,
            Self::Armswing => ModeKind::Armswing,
            Self::Fly => ModeKind::Fly,
            Self::Navigate => ModeKind::Navigate,
            Self::Climb => ModeKind::Climb,
        }
    }

    /// Scripted host input for tick `i` of `ticks`.
    fn frame(self, i: u32, ticks: u32, anchor: ClimbAnchor) -> FrameInput {
        let head = Some(Transform::from_position(Vec3::new(0.0, 1.7, 0.0)));
        let t = i as f32;
        let hands = match self {
            Self::Navigate => vec![HandFrameInput::new(
                HandId::Right,
                Transform::from_position(Vec3::new(0.2, 1.0, -0.3)),
                DeviceSample::idle().with_axis(Vec2::Y),
            )],
            Self::Fly => vec![HandFrameInput::new(
                HandId::Right,
                Transform::from_position(Vec3::new(0.2, 1.2, -0.3 - 0.02 * t)),
                DeviceSample::idle().with_trigger(true, 1.0),
            )],
            Self::Armswing => HandId::ALL
                .iter()
                .map(|hand| {
                    let phase = if *hand == HandId::Left { 0.0 } else { std::f32::consts::PI };
                    let swing = (t * 0.3 + phase).sin() * 0.3;
                    let x = if *hand == HandId::Left { -0.25 } else { 0.25 };
                    HandFrameInput::new(
                        *hand,
                        Transform::from_position(Vec3::new(x, 1.0, swing)),
                        DeviceSample::idle().with_grip(true),
                    )
                })
                .collect(),
            Self::Climb => vec![
                HandFrameInput::new(
                    HandId::Right,
                    Transform::from_position(Vec3::new(0.0, 1.5 - 0.01 * t, -0.3)),
                    DeviceSample::idle().with_grip(true),
                )
                .with_anchors(vec![anchor]),
            ],
            Self::Teleport => {
                let held = i + 1 < ticks;
                vec![HandFrameInput::new(
                    HandId::Right,
                    Transform::from_position_rotation(
                        Vec3::new(0.2, 1.2, -0.2),
                        Quat::from_rotation_x(-30.0_f32.to_radians()),
                    ),
                    DeviceSample::idle().with_trigger(held, if held { 1.0 } else { 0.0 }),
                )]
            }
        };
        FrameInput { head, hands }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("locomotion-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("core: {}", locomotion_core::crate_info());
            println!("input: {}", locomotion_input::crate_info());
            let modes: Vec<String> = ModeKind::ALL.iter().map(ToString::to_string).collect();
            println!("modes: {}", modes.join(", "));
        }
        Commands::Validate { config } => {
            let loaded = LocomotionConfig::load(&config)?;
            println!(
                "{}: OK ({} modes enabled at start)",
                config.display(),
                loaded.enabled_modes.len()
            );
        }
        Commands::DefaultConfig => {
            print!("{}", LocomotionConfig::default().to_yaml_string()?);
        }
        Commands::Simulate {
            mode,
            config,
            ticks,
            dt,
        } => {
            let mut config = match config {
                Some(path) => LocomotionConfig::load(path)?,
                None => LocomotionConfig::default(),
            };
            config.enabled_modes = vec![mode.mode()];

            let mut loco = LocomotionCoordinator::initialize(
                config,
                RigSetup::default(),
                Dependencies {
                    ray_caster: Box::new(GroundPlane::new(0.0)),
                    sinks: Vec::new(),
                },
            )?;
            let anchor = ClimbAnchor {
                id: AnchorId::new(),
                position: Vec3::new(0.0, 1.5, -0.3),
            };

            println!("Simulating {}: ticks={ticks}, dt={dt}", mode.mode());
            let mut rig = RigPose::default();
            let mut travelled = 0.0;
            for i in 0..ticks {
                let report = loco.tick(&mode.frame(i, ticks, anchor), &mut rig, dt);
                travelled += report.displacement.length();
                if let Some(target) = report.teleported_to {
                    println!("tick {}: teleported to {target:.3}", report.tick);
                }
                tracing::debug!(tick = report.tick, position = ?rig.position, "rig");
            }
            loco.shutdown();

            println!(
                "Rig: position={:.3}, gravity={}, travelled={travelled:.3}",
                rig.position,
                loco.gravity_enabled()
            );
            println!(
                "Telemetry: {}",
                serde_json::to_string_pretty(&loco.telemetry().to_json())?
            );
        }
    }

    Ok(())
}
