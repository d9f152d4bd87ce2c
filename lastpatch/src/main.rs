//! lastpatch - Entry Point
//!
//! Reports when packages were last installed or updated on hosts managed by
//! a Satellite server, by running `rpm -qa --last` as a remote job.

use std::process::ExitCode;

use clap::Parser;
use lastpatch::app::cli::Cli;
use lastpatch::app::options::AppOptions;
use lastpatch::app::run::run;
use lastpatch::logs::init_logging;
use lastpatch::settings::Settings;
use lastpatch::utils::version_info;

use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Retrieve the settings file
    let settings = match &cli.settings {
        Some(path) => match Settings::load(path).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("lastpatch: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    let options = match AppOptions::from_cli(&cli, &settings) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("lastpatch: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = init_logging(&options.logs) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let version = version_info();
    info!(
        "lastpatch {} ({}, built {})",
        version.version, version.git_hash, version.build_time
    );
    debug!("Running with options: {:?}", options);

    match run(options, await_shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Unable to listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down..."),
            Err(e) => {
                error!("Unable to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await
            }
        }
    }
}
