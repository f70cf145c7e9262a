//! gati-node - runs the fusion/pursuit loop against the mock drivetrain
//!
//! Loads the configuration and segment asset, starts the control thread,
//! requests a path to the goal given on the command line, and exits when
//! the goal finishes or on Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! gati-node --config gati.toml --start 0 0 0 --goal 5 5 90
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::Parser;

use gati_nav::control::{PursuitConfig, PursuitController};
use gati_nav::io::MockDrivetrain;
use gati_nav::localization::{FusionConfig, PoseFusionEngine};
use gati_nav::planning::{
    PathSource, PathSynthesizer, SynthesizerConfig, ZoneMap, load_segment_table,
};
use gati_nav::state::{SharedPose, create_command_channel};
use gati_nav::threads::{ControlLoop, ControlThread, DriveHandle, PathRequester};
use gati_nav::utils::{MonotonicClock, setup_ctrl_c_handler};
use gati_nav::{GatiConfig, Pose2D, Result, SwerveKinematics};

#[derive(Parser, Debug)]
#[command(name = "gati-node", version, about = "Swerve navigation node")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "gati.toml")]
    config: PathBuf,

    /// Segment asset, overriding `planning.segment_asset`
    #[arg(long)]
    asset: Option<PathBuf>,

    /// Start pose: x (m) y (m) heading (deg)
    #[arg(long, num_args = 3, allow_negative_numbers = true, default_values_t = [0.0, 0.0, 0.0])]
    start: Vec<f32>,

    /// Goal pose: x (m) y (m) heading (deg)
    #[arg(long, num_args = 3, allow_negative_numbers = true, required = true)]
    goal: Vec<f32>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30.0)]
    timeout: f32,
}

fn pose_arg(values: &[f32]) -> Pose2D {
    match values {
        [x, y, deg] => Pose2D::new(*x, *y, deg.to_radians()),
        _ => Pose2D::identity(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("gati-node failed: {}", e);
        std::process::exit(1);
    }
    log::info!("gati-node shutdown complete");
}

fn run(args: &Args) -> Result<()> {
    log::info!("Loading configuration from {:?}", args.config);
    let config = GatiConfig::load(&args.config)?;

    let zones = Arc::new(ZoneMap::from_config(&config.planning.zones)?);
    let asset = args
        .asset
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.planning.segment_asset));
    let segments = Arc::new(load_segment_table(&asset)?);
    log::info!(
        "{} zones, {} explicit segments",
        zones.len(),
        segments.len()
    );

    let kinematics = SwerveKinematics::rectangular(
        config.drivetrain.wheelbase,
        config.drivetrain.track_width,
    )?;
    let start = pose_arg(&args.start);
    let goal = pose_arg(&args.goal);

    let clock = MonotonicClock::new();
    let drivetrain = MockDrivetrain::new(kinematics.clone(), clock, start);

    let shared_pose = SharedPose::default();
    let fusion = PoseFusionEngine::new(
        drivetrain.clone(),
        kinematics.clone(),
        FusionConfig::from_localization(&config.localization),
        start,
    )
    .with_shared_pose(shared_pose.clone());

    let synthesizer: Arc<dyn PathSource> = Arc::new(PathSynthesizer::new(
        zones,
        segments,
        SynthesizerConfig::from_config(&config),
    ));
    let requester = PathRequester::new(synthesizer);
    let (command_tx, command_rx) = create_command_channel();
    let controller = PursuitController::new(PursuitConfig::from_config(&config), kinematics);

    let control = ControlLoop::new(
        fusion,
        controller,
        drivetrain.clone(),
        requester.slot(),
        command_rx,
    );
    let handle = DriveHandle::new(
        requester,
        command_tx,
        shared_pose,
        control.shared_status(),
    );

    let running = setup_ctrl_c_handler()?;
    let control_thread = ControlThread::spawn(control, Arc::clone(&running))?;

    log::info!(
        "Driving from ({:.2}, {:.2}, {:.0}°) to ({:.2}, {:.2}, {:.0}°)",
        start.x,
        start.y,
        start.theta.to_degrees(),
        goal.x,
        goal.y,
        goal.theta.to_degrees()
    );
    let generation = match handle.go_to(goal) {
        Ok(generation) => generation,
        Err(e) => {
            log::warn!("Path request failed: {}", e);
            running.store(false, Ordering::Relaxed);
            if control_thread.join().is_err() {
                log::error!("Control thread panicked");
            }
            return Ok(());
        }
    };

    let deadline = Instant::now() + Duration::from_secs_f32(args.timeout.max(0.0));
    while running.load(Ordering::Relaxed) {
        if let Some(status) = handle.wait_for(generation, Duration::from_millis(100)) {
            log::info!("Goal finished: {:?}", status);
            break;
        }
        if Instant::now() >= deadline {
            log::warn!("Goal not reached within {:.1}s", args.timeout);
            handle.stop();
            break;
        }
    }

    running.store(false, Ordering::Relaxed);
    if control_thread.join().is_err() {
        log::error!("Control thread panicked");
    }

    let fused = handle.pose();
    let truth = drivetrain.truth();
    log::info!(
        "Final pose ({:.3}, {:.3}, {:.1}°), simulated ({:.3}, {:.3}, {:.1}°)",
        fused.pose.x,
        fused.pose.y,
        fused.pose.theta.to_degrees(),
        truth.x,
        truth.y,
        truth.theta.to_degrees()
    );
    Ok(())
}
