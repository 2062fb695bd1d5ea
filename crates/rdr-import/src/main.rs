//! rdr-import - Main entry point

use anyhow::Context;
use clap::Parser;
use rdr_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use rdr_import::progress::SpinnerProgress;
use rdr_import::{
    Cli, Commands, DryRunStore, FactoryRegistry, FsObjectStore, ImportError, ImportJob, Importer,
    ObjectStore, Settings,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Pick up a local .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("rdr-import")
        .build();
    // Environment variables take precedence over the defaults above
    let log_config = log_config.with_env_overrides().unwrap_or_else(|e| {
        eprintln!("Warning: {}", e);
        LogConfig::builder().level(level).build()
    });
    let guard = init_logging(&log_config).ok().flatten();

    let code = match execute_command(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<ImportError>()
                .map(|err| err.kind().exit_code())
                .unwrap_or(1)
        },
    };

    // flush buffered log lines before exiting
    drop(guard);
    process::exit(code);
}

async fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Import {
            manifest,
            files,
            checksums,
            model,
            depositor,
            on_behalf_of,
            storage_root,
            dry_run,
        } => {
            let mut settings = Settings::from_env()?;
            if let Some(root) = storage_root {
                settings = settings.with_storage_root(root);
            }

            let mut builder = ImportJob::builder(manifest, files).depositor(depositor);
            if let Some(path) = checksums {
                builder = builder.checksum_file(path);
            }
            if let Some(model) = model {
                builder = builder.model(model.as_str());
            }
            if let Some(on_behalf_of) = on_behalf_of {
                builder = builder.on_behalf_of(on_behalf_of);
            }
            let job = builder.build()?;

            run_import(job, settings, *dry_run).await
        },
        Commands::Models => {
            for name in FactoryRegistry::with_defaults().model_names() {
                println!("{}", name);
            }
            Ok(())
        },
    }
}

async fn run_import(job: ImportJob, settings: Settings, dry_run: bool) -> anyhow::Result<()> {
    let store: Arc<dyn ObjectStore> = if dry_run {
        info!("Dry run, objects will not be written");
        Arc::new(DryRunStore::new())
    } else {
        let root: PathBuf = settings.storage_root.clone();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage root '{}'", root.display()))?;
        Arc::new(FsObjectStore::new(root))
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current row");
            on_interrupt.cancel();
        }
    });

    let importer = Importer::new(FactoryRegistry::with_defaults(), store, Arc::new(settings));
    let progress = SpinnerProgress::new("Importing...");
    let result = importer
        .run_import_with_progress(&job, &cancel, &progress)
        .await;
    progress.clear();

    let imported = result?;
    if dry_run {
        println!("Imported {} object(s) (dry run)", imported);
    } else {
        println!("Imported {} object(s)", imported);
    }
    Ok(())
}
