//! Command-line interface

use crate::models::config::{KnownHostsPolicy, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
EXAMPLES:
    ntv --server 192.168.1.100
    ntv --server 192.168.1.100 --ssh-user root --duration 10
    ntv --server 10.0.0.2 --no-udp --min-bitrate 100 --format json
    ntv --input saved-iperf3-output.txt

Settings can also come from SERVER_HOST, MIN_TRANSFER_MB, SSH_USER and
related variables, or from a .env file in the working directory.
Command-line flags take precedence.";

/// Network Throughput Validator - checks iperf3 throughput against minimums
#[derive(Parser, Debug, Clone)]
#[command(name = "ntv")]
#[command(version = crate::BUILD_INFO, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Host running the iperf3 server
    #[arg(short, long, value_name = "HOST")]
    pub server: Option<String>,

    /// iperf3 server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Length of each benchmark pass in seconds
    #[arg(short = 't', long, value_parser = parse_seconds)]
    pub duration: Option<u32>,

    /// Seconds between interval reports
    #[arg(short, long, value_parser = parse_seconds)]
    pub interval: Option<u32>,

    /// Minimum transfer per interval in MB
    #[arg(long, value_name = "MB", value_parser = parse_threshold)]
    pub min_transfer: Option<f64>,

    /// Minimum bitrate per interval in Mbit/s
    #[arg(long, value_name = "MBPS", value_parser = parse_threshold)]
    pub min_bitrate: Option<f64>,

    /// Skip the TCP pass
    #[arg(long)]
    pub no_tcp: bool,

    /// Skip the UDP pass
    #[arg(long)]
    pub no_udp: bool,

    /// Host with no iperf3 server, used to confirm that client errors are reported
    #[arg(long, value_name = "HOST")]
    pub unreachable_host: Option<String>,

    /// SSH user for starting and stopping the remote server
    #[arg(long, value_name = "USER")]
    pub ssh_user: Option<String>,

    /// SSH port on the server host
    #[arg(long)]
    pub ssh_port: Option<u16>,

    /// Private key for the SSH session
    #[arg(long, value_name = "FILE")]
    pub ssh_identity: Option<PathBuf>,

    /// Host key policy: strict, add or accept
    #[arg(long, value_name = "POLICY", value_parser = parse_known_hosts)]
    pub ssh_known_hosts: Option<KnownHostsPolicy>,

    /// Evaluate saved iperf3 output instead of running a live test
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output format: table or json
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Print an example .env file and exit
    #[arg(long)]
    pub env_example: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.no_tcp && self.no_udp {
            return Err("Cannot specify both --no-tcp and --no-udp".to_string());
        }

        if self.is_offline() {
            if self.unreachable_host.is_some() {
                return Err("--unreachable-host needs a live run and cannot be used with --input".to_string());
            }
            if self.ssh_user.is_some() {
                return Err("--ssh-user needs a live run and cannot be used with --input".to_string());
            }
        }

        Ok(())
    }

    /// True when evaluating saved output rather than running live
    pub fn is_offline(&self) -> bool {
        self.input.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line Overrides:\n");
        if let Some(ref server) = self.server {
            summary.push_str(&format!("  Server: {}\n", server));
        }
        if let Some(port) = self.port {
            summary.push_str(&format!("  Port: {}\n", port));
        }
        if let Some(duration) = self.duration {
            summary.push_str(&format!("  Duration: {}s\n", duration));
        }
        if let Some(min) = self.min_transfer {
            summary.push_str(&format!("  Minimum transfer: {} MB\n", min));
        }
        if let Some(min) = self.min_bitrate {
            summary.push_str(&format!("  Minimum bitrate: {} Mbit/s\n", min));
        }
        if self.no_tcp {
            summary.push_str("  TCP: disabled\n");
        }
        if self.no_udp {
            summary.push_str("  UDP: disabled\n");
        }
        if let Some(ref input) = self.input {
            summary.push_str(&format!("  Input file: {}\n", input.display()));
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u32, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u32>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 3600 {
                Err("Duration cannot exceed 3600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a non-negative, finite threshold
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("Invalid threshold: {}", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Threshold must be a non-negative number: {}", s));
    }
    Ok(value)
}

fn parse_known_hosts(s: &str) -> Result<KnownHostsPolicy, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["ntv", "--server", "10.0.0.2", "-t", "5"]);
        assert_eq!(cli.server.as_deref(), Some("10.0.0.2"));
        assert_eq!(cli.duration, Some(5));
        assert_eq!(cli.port, None);
        assert!(!cli.verbose);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "ntv",
            "-s", "10.0.0.2",
            "-p", "5202",
            "-t", "10",
            "-i", "2",
            "--min-transfer", "5",
            "--min-bitrate", "50.5",
            "--no-udp",
            "--unreachable-host", "10.0.0.250",
            "--ssh-user", "root",
            "--ssh-port", "2222",
            "--ssh-identity", "/tmp/id",
            "--ssh-known-hosts", "add",
            "--format", "json",
            "--no-color",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.port, Some(5202));
        assert_eq!(cli.interval, Some(2));
        assert_eq!(cli.min_transfer, Some(5.0));
        assert_eq!(cli.min_bitrate, Some(50.5));
        assert!(cli.no_udp);
        assert!(!cli.no_tcp);
        assert_eq!(cli.unreachable_host.as_deref(), Some("10.0.0.250"));
        assert_eq!(cli.ssh_port, Some(2222));
        assert_eq!(cli.ssh_known_hosts, Some(KnownHostsPolicy::Add));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.no_color && cli.verbose && cli.debug);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        assert!(Cli::parse_from(["ntv", "--color", "--no-color"]).validate().is_err());
        assert!(Cli::parse_from(["ntv", "-s", "h", "--no-tcp", "--no-udp"]).validate().is_err());
        assert!(Cli::parse_from(["ntv", "--input", "f.txt", "--ssh-user", "root"]).validate().is_err());
    }

    #[test]
    fn test_invalid_values_rejected_by_parser() {
        let err = Cli::try_parse_from(["ntv", "--min-bitrate=-1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("non-negative"));
        assert!(Cli::try_parse_from(["ntv", "--min-transfer", "lots"]).is_err());
        assert!(Cli::try_parse_from(["ntv", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["ntv", "--ssh-known-hosts", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["ntv", "-t", "0"]).is_err());
    }

    #[test]
    fn test_seconds_parsing() {
        assert_eq!(parse_seconds("1").unwrap(), 1);
        assert_eq!(parse_seconds("3600").unwrap(), 3600);
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("3601").is_err());
        assert!(parse_seconds("+10").is_err());
        assert!(parse_seconds("0x10").is_err());
        assert!(parse_seconds("10.5").is_err());
        assert!(parse_seconds("").is_err());
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!(parse_threshold("0").unwrap(), 0.0);
        assert_eq!(parse_threshold("2.5").unwrap(), 2.5);
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
        assert!(parse_threshold("-0.1").is_err());
    }

    #[test]
    fn test_offline_mode() {
        let cli = Cli::parse_from(["ntv", "--input", "run.txt"]);
        assert!(cli.is_offline());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_use_colors_method() {
        assert!(!Cli::parse_from(["ntv", "--no-color"]).use_colors());
        assert!(Cli::parse_from(["ntv", "--color"]).use_colors());
    }

    #[test]
    fn test_config_summary() {
        let cli = Cli::parse_from(["ntv", "-s", "10.0.0.2", "--min-bitrate", "30", "--no-udp"]);
        let summary = cli.get_config_summary();
        assert!(summary.contains("Server: 10.0.0.2"));
        assert!(summary.contains("Minimum bitrate: 30 Mbit/s"));
        assert!(summary.contains("UDP: disabled"));
    }
}
