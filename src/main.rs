use clap::Parser;
use log::{error, info};
use std::error::Error as _;
use std::process::ExitCode;

use supervisely2voc::{convert_dataset, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = args.to_conversion_config();
    if !config.input_dir.exists() {
        error!("The specified input_dir does not exist: {}", args.input_dir);
        return ExitCode::FAILURE;
    }

    info!("Starting Supervisely to Pascal VOC conversion...");

    match convert_dataset(&config) {
        Ok(stats) => {
            info!(
                "Finished converting {} images",
                stats.images_converted
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
