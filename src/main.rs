//! Quill - Main Entry Point
//!
//! Exports markdown notes to self-contained HTML pages.

mod cli;
mod config;
mod engine;
mod error;
mod export;
mod files;
mod template;

use clap::Parser;
use cli::Cli;
use config::{load_config, save_config_silent, ConfigService};
use error::{Error, Result};
use export::Exporter;
use log::{info, warn};
use std::process::ExitCode;
use std::sync::Arc;

/// Application name constant.
const APP_NAME: &str = "Quill";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!("Starting {}", APP_NAME);

    let settings = load_config();
    let option = cli.export_option(&settings.export);
    let open_after = cli.open || settings.export.open_after_export;
    let config = Arc::new(ConfigService::new(settings));

    let exporter = Exporter::new(Arc::clone(&config));
    let stop = exporter.stop_handle();
    if let Err(err) = ctrlc::set_handler(move || {
        if stop.is_stopped() {
            // Second interrupt while the export is still winding down.
            std::process::exit(130);
        }
        warn!("Interrupted, cancelling export");
        stop.stop();
    }) {
        warn!("Cannot install interrupt handler: {}", err);
    }

    let report = exporter.export(&option, &cli.source)?;

    config.update(|settings| {
        settings.export.last_output_directory = Some(option.output_dir.clone());
    });
    save_config_silent(&config.settings());

    for (path, reason) in &report.failed {
        eprintln!("Failed: {}: {}", path.display(), reason);
    }

    if open_after {
        if let Some(first) = report.exported.first() {
            if let Err(err) = open::that(first) {
                warn!("Failed to open {}: {}", first.display(), err);
            }
        }
    }

    if !report.is_success() {
        return Err(if report.cancelled {
            Error::Cancelled {
                exported: report.exported.len(),
            }
        } else {
            Error::Incomplete {
                failed: report.failed.len(),
                total: report.failed.len() + report.exported.len(),
            }
        });
    }

    info!("Exported {} document(s)", report.exported.len());
    Ok(())
}
