use anyhow::{Context, Result, anyhow};
use bom_core::{Config, HttpSource, Selection, TimeMode, pipeline};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use inquire::Confirm;
use std::path::{Path, PathBuf};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "bom-geojson", version, about = "Write the latest station observations as GeoJSON")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every station and write the FeatureCollection.
    Run(RunArgs),

    /// List the configured stations, or show one by name.
    Stations {
        /// Station name (case-insensitive).
        name: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a config file populated with the defaults.
    Init {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file without asking.
        #[arg(long)]
        force: bool,
    },

    /// Print where the default config file lives.
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Config file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file; overrides the config value.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Which end of the upstream list is the latest reading: "first" or "last".
    #[arg(long)]
    selection: Option<String>,

    /// Timestamp presentation: "utc" or "aest".
    #[arg(long)]
    time_mode: Option<String>,

    /// Add a `last_updated` property so the file changes on every run.
    #[arg(long, conflicts_with = "no_heartbeat")]
    heartbeat: bool,

    /// Leave out `last_updated` even if the config file enables it.
    #[arg(long)]
    no_heartbeat: bool,

    /// Exit non-zero when the output file cannot be written.
    #[arg(long)]
    strict: bool,
}

impl RunArgs {
    /// Layer the flags over a loaded config. Flags left unset keep the config value.
    fn apply(&self, cfg: &mut Config) -> Result<()> {
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
        if let Some(selection) = &self.selection {
            cfg.selection = Selection::try_from(selection.as_str())?;
        }
        if let Some(time_mode) = &self.time_mode {
            cfg.time_mode = TimeMode::try_from(time_mode.as_str())?;
        }
        if self.heartbeat {
            cfg.heartbeat = true;
        } else if self.no_heartbeat {
            cfg.heartbeat = false;
        }
        Ok(())
    }
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Config::config_file_path(),
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    match explicit {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load_from(&path)
        }
        None => Config::load(),
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run(args) => {
                let mut cfg = load_config(args.config.clone())?;
                args.apply(&mut cfg)?;

                run_once(&cfg, args.strict).await
            }
            Command::Stations { name, config } => {
                let cfg = load_config(config)?;
                match name {
                    Some(name) => {
                        let station = cfg.station(&name).ok_or_else(|| {
                            anyhow!("No station named '{name}'. Run `bom-geojson stations` to list them.")
                        })?;
                        println!("{:<16} {}", station.name, station.url);
                    }
                    None => {
                        for station in &cfg.stations {
                            println!("{:<16} {}", station.name, station.url);
                        }
                    }
                }
                Ok(())
            }
            Command::Init { config, force } => init_config(&config_path(config)?, force),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

async fn run_once(cfg: &Config, strict: bool) -> Result<()> {
    let source = HttpSource::from_config(cfg)?;

    let (report, written) = pipeline::run(&source, cfg, Utc::now()).await;

    for skipped in &report.skipped {
        println!("❌ {}: {}", skipped.station, skipped.error);
    }

    match written {
        Ok(()) => {
            println!(
                "✅ {} of {} stations saved to {}",
                report.succeeded(),
                cfg.stations.len(),
                cfg.output.display()
            );
            Ok(())
        }
        Err(e) if strict => Err(e),
        Err(e) => {
            eprintln!("❌ {e:#}");
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        let overwrite = Confirm::new(&format!("{} already exists. Overwrite?", path.display()))
            .with_default(false)
            .prompt()
            .context("Failed to read confirmation")?;

        if !overwrite {
            println!("Left {} unchanged.", path.display());
            return Ok(());
        }
    }

    Config::default().save_to(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
