//! Klaxon - desktop panic alert driver
//!
//! Plays the siren through the default audio output and simulates the strobe
//! through the log.
//!
//! # Usage
//!
//! ```bash
//! klaxon siren --seconds 5
//! klaxon siren --dual
//! klaxon strobe --seconds 3
//! klaxon panic --seconds 10
//! klaxon render siren.wav --seconds 4
//! klaxon config --write-default
//! ```

mod render;
mod torch;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use klaxon_core::config::{self, Config};
use klaxon_core::output::CpalOutput;
use klaxon_core::{AlertService, NoVolumeControl, SirenMode};

use crate::torch::LogTorch;

#[derive(Parser)]
#[command(name = "klaxon")]
#[command(author, version, about = "Klaxon - panic siren and strobe")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the siren
    Siren {
        /// Play through the in-call and ringer outputs together
        #[arg(long)]
        dual: bool,

        /// How long to play
        #[arg(long, short = 's', default_value = "5")]
        seconds: f64,
    },

    /// Pulse the (logged) torch
    Strobe {
        /// How long to pulse
        #[arg(long, short = 's', default_value = "5")]
        seconds: f64,
    },

    /// Siren and strobe together
    Panic {
        /// Play through the in-call and ringer outputs together
        #[arg(long)]
        dual: bool,

        /// How long to alert
        #[arg(long, short = 's', default_value = "10")]
        seconds: f64,
    },

    /// Render the siren to a 16-bit mono WAV file
    Render {
        /// Output file
        out: PathBuf,

        /// Length of the recording
        #[arg(long, short = 's', default_value = "4")]
        seconds: f64,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        write_default: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    config.validate()?;

    match args.command {
        Command::Siren { dual, seconds } => {
            let service = service(&config)?;
            run_siren(&service, mode(dual), seconds)?;
        }
        Command::Strobe { seconds } => {
            let torch = Arc::new(LogTorch::default());
            let service = AlertService::new(
                &config,
                Arc::new(CpalOutput::new(config.output.clone())),
                torch.clone(),
                Arc::new(NoVolumeControl),
            )?;
            info!("Strobe: {}", service.start_strobe()?.as_str());
            wait(seconds);
            info!("Strobe: {}", service.stop_strobe().as_str());
            info!("{} flashes", torch.flashes());
        }
        Command::Panic { dual, seconds } => {
            let service = service(&config)?;
            info!("Siren: {}", service.start_siren(mode(dual))?.as_str());
            info!("Strobe: {}", service.start_strobe()?.as_str());
            wait(seconds);
            service.shutdown();
        }
        Command::Render { out, seconds } => {
            let samples = render::render_wav(&out, config.siren.waveform(), seconds)?;
            info!("Wrote {} samples to {}", samples, out.display());
        }
        Command::Config { write_default } => {
            let path = args.config.clone().or_else(config::config_path);
            if write_default {
                let path = path.clone().context("No config directory on this platform")?;
                config::save_to(&Config::default(), &path)?;
                info!("Wrote default config to {}", path.display());
            }
            match &path {
                Some(path) => println!("# {}", path.display()),
                None => println!("# (no config directory)"),
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn service(config: &Config) -> Result<AlertService> {
    Ok(AlertService::new(
        config,
        Arc::new(CpalOutput::new(config.output.clone())),
        Arc::new(LogTorch::default()),
        Arc::new(NoVolumeControl),
    )?)
}

fn run_siren(service: &AlertService, mode: SirenMode, seconds: f64) -> Result<()> {
    let started = service
        .start_siren(mode)
        .with_context(|| format!("Failed to start {mode} siren"))?;
    info!("Siren: {}", started.as_str());

    // Poll so a device failure ends the wait early
    let deadline = Duration::from_secs_f64(seconds.max(0.0));
    let step = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < deadline && service.is_siren_playing() {
        thread::sleep(step);
        waited += step;
    }
    if !service.is_siren_playing() && waited < deadline {
        tracing::warn!("Siren stopped early; see log for the device error");
    }

    info!("Siren: {}", service.stop_siren().as_str());
    Ok(())
}

fn mode(dual: bool) -> SirenMode {
    if dual { SirenMode::Dual } else { SirenMode::Single }
}

fn wait(seconds: f64) {
    thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
}
