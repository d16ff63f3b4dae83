//! Backdrop demo host
//!
//! Mounts the drone backdrop on the software backend, pumps it against the
//! wall clock for a few seconds, resizes the viewport halfway through,
//! writes a PNG snapshot and unmounts.
//!
//! Usage: `backdrop_demo [config.toml|config.ron] [snapshot.png]`

use std::thread;
use std::time::Duration;

use drone_backdrop::foundation::logging;
use drone_backdrop::foundation::time::{FrameTimer, Stopwatch};
use drone_backdrop::prelude::*;
use thiserror::Error;

const RUN_TIME: Duration = Duration::from_secs(4);
const REFRESH: Duration = Duration::from_millis(16);
const CONTAINER: ContainerHandle = ContainerHandle(1);

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backdrop(#[from] BackdropError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

fn load_config(path: Option<&str>) -> Result<BackdropConfig, AppError> {
    match path {
        Some(path) => Ok(BackdropConfig::load_from_file(path)?),
        None => Ok(BackdropConfig::default()),
    }
}

fn run() -> Result<(), AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let snapshot_path = args.get(1).cloned().unwrap_or_else(|| "backdrop_snapshot.png".to_string());
    logging::init_with_level(&config.log_level);

    log::info!("Starting drone backdrop demo");
    if let Some(path) = args.first() {
        log::info!("Loaded configuration from {path}");
    }
    let mut backdrop = Backdrop::new(config, SoftwareBackend::new())?;
    let clock = Stopwatch::start_new();
    backdrop.mount(CONTAINER, Viewport::new(640, 360).with_pixel_ratio(1.0), clock.elapsed())?;

    let mut host_timer = FrameTimer::new();
    let mut resized = false;
    while clock.elapsed() < RUN_TIME {
        let now = clock.elapsed();
        host_timer.tick(now);
        backdrop.pump(now)?;

        if !resized && now >= RUN_TIME / 2 {
            backdrop.resize(Viewport::new(800, 600).with_pixel_ratio(3.0))?;
            resized = true;
        }
        thread::sleep(REFRESH);
    }

    backdrop.backend().snapshot(&snapshot_path)?;

    let stats = backdrop.stats();
    log::info!(
        "Ran {:.1}s at {:.1} fps: {} frames, {} skipped, {} blinks, {} resizes",
        host_timer.total_time(),
        host_timer.average_fps(),
        stats.frames_rendered,
        stats.frames_skipped,
        stats.blink_ticks,
        stats.resizes
    );

    backdrop.unmount();
    log::info!("Drone backdrop demo finished");
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        log::error!("Backdrop demo failed: {error}");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
