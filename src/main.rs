mod cli;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use service_downloader::{
    InstallOrchestrator, LogObserver, Platform, PlatformResolver, ServerProvider, ServiceConfig,
};
use tokio_util::sync::CancellationToken;

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(real_main()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn real_main() -> Result<()> {
    let args = cli::Args::parse();

    match args.sub {
        cli::Cmd::Platform => {
            let platform = Platform::detect();
            println!("{} ({})", platform.id(), platform.display_name());
            Ok(())
        }
        cli::Cmd::Resolve { platform } => {
            let config = load_config(args.config)?;
            handle_resolve(&config, &select_platform(platform))
        }
        cli::Cmd::Install {
            platform,
            temp_dir,
            force,
        } => {
            let config = load_config(args.config)?;
            handle_install(config, select_platform(platform), temp_dir, force).await
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ServiceConfig> {
    let path = match path {
        Some(path) => path,
        None => dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("service-downloader")
            .join("config.json"),
    };
    ServiceConfig::load(&path)
}

fn select_platform(requested: Option<String>) -> Platform {
    match requested {
        Some(id) => {
            let Ok(platform) = id.parse::<Platform>();
            platform
        }
        None => Platform::detect().clone(),
    }
}

fn handle_resolve(config: &ServiceConfig, platform: &Platform) -> Result<()> {
    let resolver = PlatformResolver::new(config);
    let file_name = resolver.file_name_for(platform)?;

    println!("platform:    {} ({})", platform.id(), platform.display_name());
    println!("file:        {file_name}");
    println!("url:         {}", resolver.download_url_for(file_name));
    println!("install dir: {}", resolver.install_dir_for(platform).display());
    Ok(())
}

async fn handle_install(
    config: ServiceConfig,
    platform: Platform,
    temp_dir: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();
    ui::cancel_on_ctrl_c(cancel.clone());

    let mut orchestrator = InstallOrchestrator::new(config)
        .with_observer(Arc::new(LogObserver))
        .with_observer(Arc::new(ui::ProgressBarObserver::new()?))
        .with_cancellation(cancel);
    if let Some(dir) = temp_dir {
        orchestrator = orchestrator.with_temp_dir(dir);
    }

    if force {
        let outcome = orchestrator
            .install_service(&platform)
            .await
            .with_context(|| format!("Failed to install service for {platform}"))?;
        info!(
            "Installed {} ({} bytes) into {}",
            outcome.file_name,
            outcome.bytes_downloaded,
            outcome.install_dir.display()
        );
    } else {
        let server = ServerProvider::new(orchestrator)
            .get_or_download_server(&platform)
            .await
            .with_context(|| format!("Failed to provide service for {platform}"))?;
        println!("{}", server.display());
    }

    Ok(())
}
