// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use tractmap_core::{DashboardConfig, Reaction};

mod replay;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a dashboard config (JSON)
    #[arg(short, long, env = "TRACTMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the cities offered by the dropdown
    Cities,
    /// Validate the config and print a summary
    Check {
        /// Print the effective config as JSON
        #[arg(long)]
        print: bool,
    },
    /// Feed a scripted session through a headless dashboard
    Replay {
        script: PathBuf,
        /// Print the final map and page state as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "tractmap", "TractMap")
        .map(|dirs| dirs.config_dir().join("dashboard.json"))
}

fn load_config(explicit: Option<&PathBuf>) -> Result<DashboardConfig> {
    if let Some(path) = explicit {
        return DashboardConfig::load(path)
            .with_context(|| format!("Could not load config {:?}", path));
    }

    if let Some(path) = user_config_path().filter(|p| p.exists()) {
        log::info!("[Config] Using {:?}", path);
        return DashboardConfig::load(&path)
            .with_context(|| format!("Could not load config {:?}", path));
    }

    log::info!("[Config] No config file, using defaults");
    Ok(DashboardConfig::default())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;

    match &cli.command {
        Commands::Cities => {
            for city in &config.cities {
                println!(
                    "{:<16} {:>10.4} {:>9.4}  z{}",
                    city.name, city.target.center.lng, city.target.center.lat, city.target.zoom
                );
            }
        }
        Commands::Check { print } => {
            println!(
                "Period layers: {} (checked) / {} (unchecked)",
                config.period.checked_layer, config.period.unchecked_layer
            );
            for toggle in &config.toggles {
                println!("Toggle: #{} -> {}", toggle.input_id, toggle.layer);
            }
            println!(
                "Legend: {} .. {} on #{}",
                config.legend.min, config.legend.max, config.legend.track_id
            );
            println!("Cities: {}", config.cities.len());
            println!("Panels: {}", config.panels.len());
            if *print {
                println!("{}", config.to_json_pretty()?);
            }
            println!("Config OK");
        }
        Commands::Replay { script, json } => {
            let script = replay::ReplayScript::load(script)?;
            let quiet = *json;
            let report = replay::run(config, &script, |i, event, reaction| {
                if quiet {
                    return;
                }
                let outcome = match reaction {
                    Reaction::None => String::new(),
                    Reaction::ScheduleFrame(ticket) => format!(" -> frame #{}", ticket.0),
                    Reaction::Click(outcome) => format!(" -> {:?}", outcome),
                    Reaction::Camera(target) => format!(
                        " -> camera ({:.4}, {:.4}) z{}",
                        target.center.lng, target.center.lat, target.zoom
                    ),
                };
                println!("[{:>3}] {:?}{}", i, event, outcome);
            });

            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} events, {} popup redraws, {} superseded",
                    report.events, report.frames_drawn, report.frames_skipped
                );
                match &report.selected {
                    Some(tract) => println!("Selected tract: {}", tract),
                    None => println!("No tract selected"),
                }
            }
        }
    }

    Ok(())
}
