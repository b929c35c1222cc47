//! Target server lifecycle
//!
//! Makes sure the gateway answers before a run. When it does not and
//! auto-start is enabled, a dev server is spawned and owned until the run
//! finishes.

use gatecheck_core::config::HarnessConfig;
use gatecheck_core::lifecycle::ServerProbe;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// Poll interval while waiting for a started server
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Why the target could not be made reachable
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Down and auto-start disabled
    #[error("target {base_url} is not reachable and auto-start is disabled")]
    Unreachable {
        /// Target
        base_url: String,
    },

    /// Base URL has no usable host or port
    #[error("cannot derive a port from {0}")]
    BadUrl(String),

    /// Dev server process could not be spawned
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Command line
        command: String,
        /// Spawn error
        #[source]
        source: io::Error,
    },

    /// Started but never answered
    #[error("dev server did not answer at {base_url} within {secs}s")]
    NotReady {
        /// Target
        base_url: String,
        /// Seconds waited
        secs: u64,
    },
}

/// Port the target listens on
///
/// An explicit port wins; otherwise 443 for https, 3000 for plain http on
/// a local host, else 80.
///
/// # Errors
/// Returns `ServerError::BadUrl` if the URL does not parse
pub fn target_port(base_url: &str) -> Result<u16, ServerError> {
    let url = reqwest::Url::parse(base_url).map_err(|_| ServerError::BadUrl(base_url.to_string()))?;
    if let Some(port) = url.port() {
        return Ok(port);
    }
    let local = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]" | "::1"));
    Ok(match url.scheme() {
        "https" => 443,
        "http" if local => 3000,
        _ => 80,
    })
}

/// Dev server command line for a port
#[must_use]
pub fn dev_command_line(template: &str, port: u16) -> String {
    if template.contains("{port}") {
        template.replace("{port}", &port.to_string())
    } else {
        format!("{template} -p {port}")
    }
}

/// A dev server this process started
#[derive(Debug)]
pub struct DevServer {
    command: String,
    child: Child,
}

impl DevServer {
    /// Spawn through the platform shell
    ///
    /// # Errors
    /// Returns `ServerError::Spawn` if the process cannot be created
    pub fn spawn(command: &str) -> Result<Self, ServerError> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ServerError::Spawn {
                command: command.to_string(),
                source,
            })?;

        info!(command, pid = ?child.id(), "dev server started");
        Ok(Self {
            command: command.to_string(),
            child,
        })
    }

    /// Command line it was started with
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Kill the process and reap it
    pub async fn stop(mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "dev server already exited");
        }
        match self.child.wait().await {
            Ok(status) => info!(%status, "dev server stopped"),
            Err(e) => warn!(error = %e, "failed to reap dev server"),
        }
    }
}

/// Ensure the target answers, starting a dev server if allowed
///
/// Returns the started server, or `None` when the target was already up.
///
/// # Errors
/// Returns `ServerError` when the target stays unreachable
pub async fn ensure_running(
    probe: &dyn ServerProbe,
    config: &HarnessConfig,
) -> Result<Option<DevServer>, ServerError> {
    if probe.is_reachable(&config.base_url).await {
        info!(base_url = %config.base_url, "target reachable");
        return Ok(None);
    }
    if !config.auto_start {
        return Err(ServerError::Unreachable {
            base_url: config.base_url.clone(),
        });
    }

    let port = target_port(&config.base_url)?;
    let command = dev_command_line(&config.dev_command, port);
    warn!(base_url = %config.base_url, %command, "target unreachable, starting dev server");
    let server = DevServer::spawn(&command)?;

    let ready = probe
        .wait_until_reachable(
            &config.base_url,
            Duration::from_secs(config.start_timeout_secs),
            READY_POLL_INTERVAL,
        )
        .await;
    if ready {
        Ok(Some(server))
    } else {
        server.stop().await;
        Err(ServerError::NotReady {
            base_url: config.base_url.clone(),
            secs: config.start_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProbe(bool);

    #[async_trait]
    impl ServerProbe for FixedProbe {
        async fn is_reachable(&self, _base_url: &str) -> bool {
            self.0
        }
    }

    #[test]
    fn port_defaults() {
        assert_eq!(target_port("http://localhost").unwrap(), 3000);
        assert_eq!(target_port("http://127.0.0.1:8080").unwrap(), 8080);
        assert_eq!(target_port("https://gw.example").unwrap(), 443);
        assert_eq!(target_port("http://gw.example").unwrap(), 80);
        assert!(target_port("nope").is_err());
    }

    #[test]
    fn command_line_substitutes_or_appends_port() {
        assert_eq!(dev_command_line("pnpm dev -p {port}", 3000), "pnpm dev -p 3000");
        assert_eq!(dev_command_line("npm run dev", 4000), "npm run dev -p 4000");
    }

    #[tokio::test]
    async fn reachable_target_starts_nothing() {
        let server = ensure_running(&FixedProbe(true), &HarnessConfig::default()).await.unwrap();
        assert!(server.is_none());
    }

    #[tokio::test]
    async fn unreachable_without_auto_start_fails() {
        let config = HarnessConfig {
            auto_start: false,
            ..HarnessConfig::default()
        };
        let err = ensure_running(&FixedProbe(false), &config).await.unwrap_err();
        assert!(matches!(err, ServerError::Unreachable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn started_server_that_never_answers_is_stopped() {
        let config = HarnessConfig {
            dev_command: "sleep 30 # {port}".to_string(),
            start_timeout_secs: 0,
            ..HarnessConfig::default()
        };
        let err = ensure_running(&FixedProbe(false), &config).await.unwrap_err();
        assert!(matches!(err, ServerError::NotReady { secs: 0, .. }));
    }
}
