//! Main application orchestration and execution

use crate::{
    cli::Cli,
    client::Iperf3Client,
    config::{display_config_summary, load_config, validate_config, EnvManager},
    diagnostics::PingChecker,
    error::{AppError, Result},
    executor::{OfflineReport, TestRunner},
    logging::LoggerFactory,
    models::Config,
    output::OutputCoordinator,
    remote::SshServerController,
};
use std::{path::Path, sync::Arc};

/// Where panics should be reported
pub const ISSUE_TRACKER: &str = "https://github.com/MaurUppi/network-throughput-validator/issues";

/// Chain a hook that points at the issue tracker onto the current panic hook
///
/// The hook only reports. Unwinding continues afterwards, so a panic inside a
/// run still stops the remote server before the process exits.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        previous(panic_info);
        eprintln!("Please report this issue at: {}", ISSUE_TRACKER);
    }));
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        Ok(Self { cli })
    }

    /// Run the application
    ///
    /// A completed run that did not pass is reported as
    /// [`AppError::TestExecution`] so the process exits non-zero.
    pub async fn run(self) -> Result<()> {
        if self.cli.env_example {
            print!("{}", EnvManager::create_example_env_content());
            return Ok(());
        }

        let config = load_config(self.cli.clone())?;
        let warnings = validate_config(&config)?;
        let coordinator = OutputCoordinator::from_config(&config);

        if config.debug {
            eprintln!("{} v{}", crate::PKG_NAME, crate::build_info());
            eprintln!("{}", self.cli.get_config_summary());
            eprintln!("\nConfiguration Summary:");
            eprintln!("{}\n", display_config_summary(&config));
            eprintln!("{}", EnvManager::display_env_help());
        }

        if let Some(text) = coordinator.display_warnings(&warnings, config.enable_color) {
            eprintln!("Configuration Warnings:");
            for line in text.lines() {
                eprintln!("  {}", line);
            }
            eprintln!();
        }

        match self.cli.input {
            Some(ref path) => Self::run_offline(&config, &coordinator, path).await,
            None => Self::run_live(config, &coordinator).await,
        }
    }

    /// Evaluate saved iperf3 output without touching the network
    async fn run_offline(config: &Config, coordinator: &OutputCoordinator, path: &Path) -> Result<()> {
        let text = read_saved_output(path).await?;

        let report = OfflineReport::from_text(path.display().to_string(), &text, config.thresholds())?;
        println!("{}", coordinator.display_offline_report(&report)?);

        if report.passed() {
            Ok(())
        } else {
            Err(AppError::test_execution(format!(
                "No interval in {} is above {} MB and {} Mbit/s",
                path.display(),
                config.min_transfer_mb,
                config.min_bitrate_mbps
            )))
        }
    }

    async fn run_live(config: Config, coordinator: &OutputCoordinator) -> Result<()> {
        let target = config.require_server_host()?.to_string();

        let factory = LoggerFactory::new(config.clone());
        let logger = Arc::new(factory.create_run_logger().await);

        let mut runner = TestRunner::new(
            config.clone(),
            Arc::new(PingChecker::from_config(&config)),
            Arc::new(Iperf3Client::from_config(&config)),
            logger.clone(),
        )?
        .with_session_id(factory.session_id());

        if let Some(remote) = SshServerController::from_config(&config) {
            runner = runner.with_remote(Arc::new(remote.with_logger(logger.clone())));
        }

        if config.verbose && !coordinator.is_json() {
            eprintln!("Validating throughput against {}:{}...", target, config.port);
        }

        let report = runner.run().await?;

        println!("{}", coordinator.display_run_report(&report)?);

        if report.passed() {
            Ok(())
        } else {
            Err(AppError::test_execution(report.failures().join("; ")))
        }
    }
}

/// Read captured client output without blocking the runtime
async fn read_saved_output(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(format!("Failed to read {}: {}", path.display(), e)))
}
