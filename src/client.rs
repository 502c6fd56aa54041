//! iperf3 client invocation

use crate::{models::Config, types::Transport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    process::Stdio,
    time::{Duration, Instant},
};
use tokio::{process::Command, time::timeout};

/// Benchmark client trait for abstraction and testing
#[async_trait]
pub trait BenchmarkClient: Send + Sync {
    /// Run one benchmark pass
    ///
    /// Launch failures and timeouts are reported through the returned
    /// output's stderr rather than as errors, the same way iperf3 reports a
    /// refused connection.
    async fn run(&self, request: &BenchmarkRequest) -> BenchmarkOutput;
}

/// A single benchmark pass against a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    /// Seconds between interval reports
    pub interval_seconds: u32,
    /// Length of the pass, iperf3's default when unset
    pub duration_seconds: Option<u32>,
}

impl BenchmarkRequest {
    pub fn new(host: impl Into<String>, transport: Transport) -> Self {
        Self {
            host: host.into(),
            port: crate::defaults::DEFAULT_PORT,
            transport,
            interval_seconds: crate::defaults::DEFAULT_REPORT_INTERVAL_SECS,
            duration_seconds: None,
        }
    }

    /// Build a request for `host` using the configured port and timing
    pub fn from_config(config: &Config, host: impl Into<String>, transport: Transport) -> Self {
        Self::new(host, transport)
            .with_port(config.port)
            .with_interval(config.report_interval_seconds)
            .with_duration(config.test_duration_seconds)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_interval(mut self, seconds: u32) -> Self {
        self.interval_seconds = seconds;
        self
    }

    pub fn with_duration(mut self, seconds: Option<u32>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// iperf3 command-line arguments for this request
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.host.clone(),
            "-p".to_string(),
            self.port.to_string(),
            "-i".to_string(),
            self.interval_seconds.to_string(),
        ];

        if let Some(duration) = self.duration_seconds {
            args.push("-t".to_string());
            args.push(duration.to_string());
        }

        if self.transport == Transport::Udp {
            args.push("-u".to_string());
        }

        args
    }
}

/// Captured result of a client invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit status, absent when the process never ran or was killed
    pub exit_code: Option<i32>,
    pub duration_ms: f64,
}

impl BenchmarkOutput {
    /// Output for a process that could not be run to completion
    pub fn failed(stderr: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: None,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// True when the client reported an error on stderr
    pub fn has_error(&self) -> bool {
        self.stderr.to_lowercase().contains("error")
    }
}

/// Benchmark client backed by the iperf3 binary
#[derive(Debug, Clone)]
pub struct Iperf3Client {
    iperf3_path: String,
    timeout: Duration,
}

impl Iperf3Client {
    pub fn new(iperf3_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            iperf3_path: iperf3_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.iperf3_path.clone(), config.client_timeout())
    }

    pub fn program(&self) -> &str {
        &self.iperf3_path
    }
}

#[async_trait]
impl BenchmarkClient for Iperf3Client {
    async fn run(&self, request: &BenchmarkRequest) -> BenchmarkOutput {
        let started = Instant::now();
        let child = Command::new(&self.iperf3_path)
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match timeout(self.timeout, child).await {
            Ok(Ok(output)) => BenchmarkOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            },
            Ok(Err(e)) => BenchmarkOutput::failed(
                format!("error: failed to run {}: {}", self.iperf3_path, e),
                started.elapsed(),
            ),
            Err(_) => BenchmarkOutput::failed(
                format!(
                    "error: {} did not finish within {}s",
                    self.iperf3_path,
                    self.timeout.as_secs()
                ),
                started.elapsed(),
            ),
        }
    }
}
