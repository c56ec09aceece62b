mod config;
mod context;
mod doppler;
mod predict;
mod radio;
mod scheduler;
mod tracker;
mod tuning;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::config::Config;
use crate::context::SharedContext;
use crate::predict::{
    find_in_file, find_passes, ground_track, satellite_names, MapGeometry, Observer, SgpSatellite,
};
use crate::scheduler::Coordinator;
use crate::tuning::TuningLoop;

#[derive(Parser)]
#[command(name = "satcat")]
#[command(about = "Satellite tracking and CAT frequency control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: String },
    /// Track the configured presets and drive the rig
    Run { config: String },
    /// Print the next passes of a satellite
    Passes {
        /// The satellite name
        satellite: String,
        /// The element group file to search
        tle_file: String,
        /// Configuration file supplying the observer location
        #[arg(short, long, default_value = "satcat.yaml")]
        config: String,
        /// Number of passes to compute
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        /// Only print passes with at least this peak elevation (degrees)
        #[arg(short = 'e', long, default_value_t = 0.0)]
        min_elevation: f64,
    },
    /// List the satellites in an element group file
    Sats { tle_file: String },
    /// Print the current map-projected ground track of a satellite
    Track {
        /// The satellite name
        satellite: String,
        /// The element group file to search
        tle_file: String,
        /// Configuration file supplying the observer location
        #[arg(short, long, default_value = "satcat.yaml")]
        config: String,
        /// Map width in pixels
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        /// Map height in pixels
        #[arg(long, default_value_t = 640.0)]
        height: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config } => run(&config).await,
        Commands::Passes {
            satellite,
            tle_file,
            config,
            count,
            min_elevation,
        } => passes(&satellite, &tle_file, &config, count, min_elevation),
        Commands::Sats { tle_file } => sats(&tle_file),
        Commands::Track {
            satellite,
            tle_file,
            config,
            width,
            height,
        } => track(&satellite, &tle_file, &config, width, height),
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let observer = config.observer();
    println!(
        "Observer: {:.6} {:.6}, {} m",
        observer.latitude_deg, observer.longitude_deg, observer.elevation_m
    );
    println!("Config is valid ({} presets)", config.presets.len());
    for (i, preset) in config.presets.iter().enumerate() {
        println!(
            "  {}: {} [{}] up {} MHz / down {} MHz",
            i + 1,
            preset.name,
            preset.satellite,
            preset.uplink.frequency_mhz,
            preset.downlink.frequency_mhz,
        );
    }
    ExitCode::SUCCESS
}

async fn run(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error reading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = SharedContext::from_config(&config);
    let coordinator = Coordinator::from_config(&config, ctx.clone());
    let tuning = TuningLoop::new(ctx.clone(), config.clone());

    let (stop_track, join_track) = coordinator.spawn();
    let (stop_tune, join_tune) = tuning.spawn();

    let mut status = tokio::time::interval(std::time::Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = status.tick() => log_status(&ctx),
        }
    }

    // Both loops observe the stop signal within one sleep cycle; wait for
    // them before tearing down the serial port.
    info!("shutting down");
    let _ = stop_track.send(());
    let _ = stop_tune.send(());
    let _ = join_track.await;
    let _ = join_tune.await;
    info!("shutdown complete");
    ExitCode::SUCCESS
}

fn log_status(ctx: &SharedContext) {
    use log::debug;

    let snap = ctx.snapshot();
    let now = Utc::now();

    info!(
        "az {:.1} el {:.1} range {:.0} km{}",
        snap.current.azimuth_deg,
        snap.current.elevation_deg,
        snap.current.range_km,
        if snap.current.eclipsed { " (eclipse)" } else { "" },
    );
    if snap.current_pass.los > now {
        info!(
            "pass: AOS {} max el {:.1} LOS {}",
            snap.current_pass.aos.format("%H:%M:%S"),
            snap.current_pass.max_elevation_deg,
            snap.current_pass.los.format("%H:%M:%S"),
        );
    }
    if let Some(aos) = snap.next_aos {
        if aos > now {
            let until = (aos - now).to_std().unwrap_or_default();
            let whole = std::time::Duration::from_secs(until.as_secs());
            info!("next AOS in {}", humantime::format_duration(whole));
        }
    }
    for entry in &snap.pass_table {
        debug!(
            "upcoming: {} AOS {} max el {:.1} LOS {}",
            entry.satellite,
            entry.aos.format("%H:%M:%S"),
            entry.max_elevation_deg,
            entry.los.format("%H:%M:%S"),
        );
    }
    if snap.cat_enabled {
        info!(
            "rig {}",
            if snap.connected { "connected" } else { "not connected" }
        );
    }
}

fn passes(satellite: &str, tle_file: &str, config: &str, count: usize, min_elevation: f64) -> ExitCode {
    let observer = match Config::from_file(config) {
        Ok(c) => c.observer(),
        Err(e) => {
            warn!("config unavailable ({e}), using a zero observer location");
            Observer::default()
        }
    };

    let (line1, line2) = match find_in_file(Path::new(tle_file), satellite) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let sat = match SgpSatellite::new(Some(satellite.trim().to_uppercase()), &line1, &line2, observer)
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let found = match find_passes(&sat, Utc::now(), count, min_elevation) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{:<12}{:<10}{:<8}{:<10}{:<8}",
        "Date", "AOS", "Max El", "LOS", "Dur"
    );
    for pass in found {
        let dur = pass.duration();
        println!(
            "{:<12}{:<10}{:<8.1}{:<10}{:>2}:{:02}",
            pass.aos.format("%Y-%m-%d"),
            pass.aos.format("%H:%M:%S"),
            pass.max_elevation_deg,
            pass.los.format("%H:%M:%S"),
            dur.num_minutes(),
            dur.num_seconds() % 60,
        );
    }
    ExitCode::SUCCESS
}

fn track(satellite: &str, tle_file: &str, config: &str, width: f64, height: f64) -> ExitCode {
    let observer = match Config::from_file(config) {
        Ok(c) => c.observer(),
        Err(e) => {
            warn!("config unavailable ({e}), using a zero observer location");
            Observer::default()
        }
    };

    let (line1, line2) = match find_in_file(Path::new(tle_file), satellite) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let sat = match SgpSatellite::new(Some(satellite.trim().to_uppercase()), &line1, &line2, observer)
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let map = MapGeometry::new(width, height);
    match ground_track(&sat, &map, Utc::now()) {
        Ok(track) => {
            for (i, segment) in track.segments.iter().enumerate() {
                println!("segment {} ({} points)", i + 1, segment.len());
                for (x, y) in segment {
                    println!("  {:.1} {:.1}", x, y);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn sats(tle_file: &str) -> ExitCode {
    match satellite_names(Path::new(tle_file)) {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
