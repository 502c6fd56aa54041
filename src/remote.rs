//! Remote iperf3 server lifecycle over SSH
//!
//! The server host gets a fresh daemonized `iperf3 -s` for the duration of a
//! run. Whatever happens inside the run, the server is killed and the session
//! closed afterwards.

use crate::{
    error::{AppError, Result},
    logging::RunLogger,
    models::{config::KnownHostsPolicy, Config, SshConfig},
};
use async_trait::async_trait;
use futures::FutureExt;
use openssh::{KnownHosts, Session, SessionBuilder};
use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};
use tokio::sync::Mutex;

const KILL_SERVER: &str = "pkill iperf3 || true";

/// Starts and stops the benchmark server on the target host
#[async_trait]
pub trait RemoteServerController: Send + Sync {
    /// Start a fresh server, returning any error text it printed on startup
    async fn start(&self) -> Result<Option<String>>;

    /// Stop the server and release the connection
    async fn stop(&self) -> Result<()>;
}

impl From<KnownHostsPolicy> for KnownHosts {
    fn from(policy: KnownHostsPolicy) -> Self {
        match policy {
            KnownHostsPolicy::Strict => KnownHosts::Strict,
            KnownHostsPolicy::Add => KnownHosts::Add,
            KnownHostsPolicy::Accept => KnownHosts::Accept,
        }
    }
}

/// Server controller backed by an openssh session
pub struct SshServerController {
    host: String,
    server_port: u16,
    iperf3_path: String,
    ssh: SshConfig,
    session: Mutex<Option<Session>>,
    logger: Option<Arc<RunLogger>>,
}

impl SshServerController {
    pub fn new(host: impl Into<String>, server_port: u16, ssh: SshConfig) -> Self {
        Self {
            host: host.into(),
            server_port,
            iperf3_path: crate::defaults::DEFAULT_IPERF3_PATH.to_string(),
            ssh,
            session: Mutex::new(None),
            logger: None,
        }
    }

    /// Controller for the configured server host, if SSH is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        let ssh = config.ssh.clone()?;
        let host = config.server_host.clone()?;
        Some(Self::new(host, config.port, ssh).with_iperf3_path(config.iperf3_path.clone()))
    }

    /// Path of the iperf3 binary on the remote host
    pub fn with_iperf3_path(mut self, path: impl Into<String>) -> Self {
        self.iperf3_path = path.into();
        self
    }

    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.ssh.user, self.host)
    }

    /// Shell command that launches the daemonized server
    pub fn server_command(&self) -> String {
        format!("{} -s -D -p {}", self.iperf3_path, self.server_port)
    }

    async fn connect(&self) -> Result<Session> {
        let mut builder = SessionBuilder::default();
        builder
            .known_hosts_check(self.ssh.known_hosts.into())
            .connect_timeout(self.ssh.connect_timeout())
            .port(self.ssh.port);

        if let Some(ref identity) = self.ssh.identity_file {
            builder.keyfile(identity);
        }

        let destination = self.destination();
        builder.connect(&destination).await.map_err(|e| {
            AppError::remote_shell(format!("Failed to connect to {}: {}", destination, e))
        })
    }

    /// Run `command` through the remote shell and return its stderr
    async fn exec(&self, session: &Session, command: &str) -> Result<String> {
        let output = session
            .command("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| AppError::remote_shell(format!("Remote command '{}' failed: {}", command, e)))?;

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    async fn log_step(&self, step: &str, success: bool, detail: Option<&str>) {
        if let Some(ref logger) = self.logger {
            logger.log_remote_step(&self.host, step, success, detail).await;
        }
    }
}

#[async_trait]
impl RemoteServerController for SshServerController {
    async fn start(&self) -> Result<Option<String>> {
        let mut guard = self.session.lock().await;

        // a second start reuses the open session
        if guard.is_none() {
            match self.connect().await {
                Ok(session) => {
                    self.log_step("connect", true, None).await;
                    *guard = Some(session);
                }
                Err(e) => {
                    self.log_step("connect", false, Some(&e.to_string())).await;
                    return Err(e);
                }
            }
        }

        let Some(session) = guard.as_ref() else {
            return Err(AppError::internal("SSH session missing after connect"));
        };

        self.exec(session, KILL_SERVER).await?;
        self.log_step("stale server cleanup", true, None).await;
        tokio::time::sleep(self.ssh.startup_delay()).await;

        let stderr = self.exec(session, &self.server_command()).await?;
        tokio::time::sleep(self.ssh.startup_delay()).await;

        let stderr = stderr.trim();
        if stderr.is_empty() {
            self.log_step("server start", true, None).await;
            Ok(None)
        } else {
            self.log_step("server start", false, Some(stderr)).await;
            Ok(Some(stderr.to_string()))
        }
    }

    async fn stop(&self) -> Result<()> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };

        let killed = self.exec(&session, KILL_SERVER).await;
        self.log_step("server stop", killed.is_ok(), None).await;

        // the session is closed even when the kill failed
        let closed = session.close().await;
        self.log_step("disconnect", closed.is_ok(), None).await;

        killed?;
        closed?;
        Ok(())
    }
}

/// Run `work` with the remote server started, stopping it afterwards
///
/// `stop` runs whether `work` returns normally or panics. A panic is resumed
/// once the server is down. Startup error text and a failed connection are
/// handed to `work` instead of aborting, so the run can still report on them.
pub async fn with_server<C, F, Fut, T>(controller: &C, work: F) -> Result<T>
where
    C: RemoteServerController + ?Sized,
    F: FnOnce(std::result::Result<Option<String>, AppError>) -> Fut,
    Fut: Future<Output = T>,
{
    let started = controller.start().await;

    let outcome = AssertUnwindSafe(work(started)).catch_unwind().await;
    let stopped = controller.stop().await;

    match outcome {
        Ok(value) => {
            stopped?;
            Ok(value)
        }
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
