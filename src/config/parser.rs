//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::{config::SshConfig, Config},
};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read the .env file from a different location
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        if self.cli.debug {
            if let Some(issues) = EnvManager::check_env_file(&self.env_file)? {
                for issue in issues {
                    eprintln!("{}: {}", self.env_file.display(), issue);
                }
            }
        }

        // .env never overrides variables that are already set
        EnvManager::load_env_file_from(&self.env_file, self.cli.debug)?;

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(ref server) = cli.server {
            config.server_host = Some(server.trim().to_string());
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(duration) = cli.duration {
            config.test_duration_seconds = Some(duration);
        }

        if let Some(interval) = cli.interval {
            config.report_interval_seconds = interval;
        }

        if let Some(min) = cli.min_transfer {
            config.min_transfer_mb = min;
        }

        if let Some(min) = cli.min_bitrate {
            config.min_bitrate_mbps = min;
        }

        if cli.no_tcp {
            config.run_tcp = false;
        }

        if cli.no_udp {
            config.run_udp = false;
        }

        if let Some(ref host) = cli.unreachable_host {
            config.unreachable_host = Some(host.trim().to_string());
        }

        self.apply_ssh_overrides(config)?;

        if let Some(format) = cli.format {
            config.output_format = format;
        }

        if cli.color {
            config.enable_color = true;
        } else if !cli.use_colors() {
            config.enable_color = false;
        }

        // These are CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: server={}, port={}, thresholds={} MB / {} Mbit/s",
                config.server_host.as_deref().unwrap_or("<none>"),
                config.port,
                config.min_transfer_mb,
                config.min_bitrate_mbps
            );
        }

        Ok(())
    }

    fn apply_ssh_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(ref user) = cli.ssh_user {
            match &mut config.ssh {
                Some(ssh) => ssh.user = user.trim().to_string(),
                None => config.ssh = Some(SshConfig::new(user.trim())),
            }
        }

        let has_details = cli.ssh_port.is_some() || cli.ssh_identity.is_some() || cli.ssh_known_hosts.is_some();
        let ssh = match (&mut config.ssh, has_details) {
            (Some(ssh), _) => ssh,
            (None, false) => return Ok(()),
            (None, true) => {
                return Err(AppError::config("SSH options require --ssh-user or SSH_USER"));
            }
        };

        if let Some(port) = cli.ssh_port {
            ssh.port = port;
        }

        if let Some(ref identity) = cli.ssh_identity {
            ssh.identity_file = Some(identity.clone());
        }

        if let Some(policy) = cli.ssh_known_hosts {
            ssh.known_hosts = policy;
        }

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!(
        "Server: {}:{}",
        config.server_host.as_deref().unwrap_or("<none>"),
        config.port
    ));
    summary.push(format!(
        "Ping: {} requests, {}s timeout",
        config.ping_count, config.ping_timeout_seconds
    ));
    summary.push(format!(
        "Duration: {}",
        config
            .test_duration_seconds
            .map(|d| format!("{}s", d))
            .unwrap_or_else(|| "iperf3 default".to_string())
    ));
    summary.push(format!("Report Interval: {}s", config.report_interval_seconds));
    summary.push(format!("Client Timeout: {}s", config.client_timeout_seconds));

    let mut transports = Vec::new();
    if config.run_tcp {
        transports.push("TCP");
    }
    if config.run_udp {
        transports.push("UDP");
    }
    summary.push(format!("Transports: {}", transports.join(", ")));

    summary.push(format!(
        "Thresholds: > {} MB and > {} Mbit/s",
        config.min_transfer_mb, config.min_bitrate_mbps
    ));

    if let Some(ref host) = config.unreachable_host {
        summary.push(format!("Unreachable Host: {}", host));
    }

    match &config.ssh {
        Some(ssh) => summary.push(format!(
            "SSH: {}@{}:{} (host keys: {})",
            ssh.user,
            config.server_host.as_deref().unwrap_or("<none>"),
            ssh.port,
            ssh.known_hosts
        )),
        None => summary.push("SSH: disabled".to_string()),
    }

    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
