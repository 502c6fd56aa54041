//! Network Throughput Validator - Main CLI Application
//!
//! Checks that an iperf3 server can be reached, measures TCP and UDP
//! throughput against it and fails when no interval clears the configured
//! transfer and bitrate minimums.

use clap::Parser;
use futures::FutureExt;
use network_throughput_validator::{
    app::{install_panic_hook, App},
    cli::Cli,
    config::EnvManager,
    error::AppError,
};
use std::{error::Error, panic::AssertUnwindSafe, process};

#[tokio::main]
async fn main() {
    install_panic_hook();

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let use_color = cli.use_colors();
    let run = AssertUnwindSafe(async move {
        match App::new(cli) {
            Ok(app) => app.run().await,
            Err(e) => Err(e),
        }
    });

    // the hook has already reported the panic and cleanup has unwound
    let result = match run.catch_unwind().await {
        Ok(result) => result,
        Err(_) => process::exit(1),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.format_for_console(use_color));

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Pass the server with --server or set SERVER_HOST");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Thresholds must be non-negative numbers");
            eprintln!("  - Run with --help to see every option");
            if let Ok(issues) = EnvManager::validate_current_env() {
                for issue in issues {
                    eprintln!("  - {}", issue);
                }
            }
        }
        AppError::Reachability(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Verify the server address");
            eprintln!("  - Check that ICMP echo is not blocked by a firewall");
            eprintln!("  - Try 'ping <server>' manually");
        }
        AppError::RemoteShell(_) => {
            eprintln!();
            eprintln!("SSH help:");
            eprintln!("  - Check that key or agent authentication works with 'ssh user@server'");
            eprintln!("  - Use --ssh-identity to point at a private key");
            eprintln!("  - Use --ssh-known-hosts add for a first connection");
        }
        AppError::Process(_) | AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Tool troubleshooting:");
            eprintln!("  - Make sure iperf3 and ping are installed and on PATH");
            eprintln!("  - Raise CLIENT_TIMEOUT_SECONDS for long runs");
        }
        AppError::TestExecution(_) => {
            eprintln!();
            eprintln!("Execution troubleshooting:");
            eprintln!("  - Confirm the server is running 'iperf3 -s' on the expected port");
            eprintln!("  - Lower --min-transfer or --min-bitrate for slow links");
            eprintln!("  - Run with --verbose for the full interval table");
        }
        _ => {}
    }
}
