use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use monitor_app::{load_env_file, run_detached, run_monitor, Cli, MonitorConfig, TtyPrompt};
use monitor_engine::{MonitorOutcome, TelegramNotifier};
use monitor_logging::{monitor_info, monitor_warn, LogDestination};
use tokio_util::sync::CancellationToken;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let destination = match cli.log_file.as_deref() {
        Some(path) => LogDestination::TerminalAndFile(path),
        None => LogDestination::Terminal,
    };
    monitor_logging::initialize(destination, cli.log_level);

    if load_env_file(cli.env_file.as_deref())? {
        monitor_info!("Loaded environment file");
    }
    let config = MonitorConfig::from_cli(&cli, |name| std::env::var(name).ok())?;
    let notifier = TelegramNotifier::new(config.telegram.clone())
        .context("failed to build Telegram client")?;

    let MonitorOutcome::Stopped { cycles } = run_detached(async {
        let shutdown = CancellationToken::new();
        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    monitor_info!("Interrupt received, shutting down...");
                    interrupt.cancel();
                }
                Err(err) => monitor_warn!("Could not listen for interrupt: {}", err),
            }
        });

        run_monitor(&config, Arc::new(notifier), Arc::new(TtyPrompt), shutdown).await
    })
    .context("failed to start async runtime")??;

    monitor_info!("Course monitor exited after {} polls", cycles);
    Ok(())
}
