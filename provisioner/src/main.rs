//! Provisioner - Entry Point
//!
//! Creates a function, its execution role and an optional web API from the
//! project in the current directory, then writes claudia.json.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error};

use provisioner::cli::Args;
use provisioner::deploy::module::ManifestModuleLoader;
use provisioner::deploy::pipeline::{Collaborators, Pipeline};
use provisioner::deploy::project::LocalProjectPreparer;
use provisioner::deploy::stage::TracingLogger;
use provisioner::http::client::HttpClient;
use provisioner::logs::{init_logging, LogOptions};
use provisioner::storage::settings::Settings;
use provisioner::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Provisioning failed: {:#}", e);
            eprintln!("{}", format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<String> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path).await?,
        None => Settings::default(),
    };
    if let Some(url) = &args.backend_url {
        settings.backend.base_url = url.clone();
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let version = version_info();
    debug!(
        "provision {} ({}, built {})",
        version.version, version.git_hash, version.build_time
    );

    let current_dir = std::env::current_dir().context("Unable to read the current directory")?;
    let request = args.into_request(current_dir);

    let backend = Arc::new(HttpClient::from_settings(&settings.backend)?);
    let collaborators = Collaborators {
        preparer: Arc::new(LocalProjectPreparer::new()),
        identity: backend.clone(),
        compute: backend.clone(),
        gateway: backend,
        modules: Arc::new(ManifestModuleLoader),
    };

    let pipeline = Pipeline::new(collaborators)
        .with_logger(Arc::new(TracingLogger))
        .with_retry(settings.retry);

    let summary = pipeline.run(&request).await?;
    Ok(serde_json::to_string_pretty(&summary)?)
}
