use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, ToolError};
use crate::fs_util::write_atomic;
use crate::output;
use crate::privilege::Privilege;
use crate::runner::{command_line, CommandRunner};

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:7890";
pub const DEFAULT_NO_PROXY: &str = "localhost,127.0.0.1,::1";

const CLIENT_CONFIG_FILE: &str = "config.json";
const DAEMON_PROXY_FILE: &str = "http-proxy.conf";
const PRIVILEGE_HINT: &str = "Root privileges required for Docker daemon proxy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub http: String,
    pub https: String,
    pub no_proxy: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        ProxySettings {
            http: DEFAULT_PROXY_URL.to_string(),
            https: DEFAULT_PROXY_URL.to_string(),
            no_proxy: DEFAULT_NO_PROXY.to_string(),
        }
    }
}

impl ProxySettings {
    /// Points both HTTP and HTTPS at `url`; `no_proxy` is kept.
    pub fn with_proxy_url(mut self, url: &str) -> Self {
        self.http = url.to_string();
        self.https = url.to_string();
        self
    }

    fn daemon_unit(&self) -> String {
        format!(
            "[Service]\n\
             Environment=\"HTTP_PROXY={}\"\n\
             Environment=\"HTTPS_PROXY={}\"\n\
             Environment=\"NO_PROXY={}\"\n",
            self.http, self.https, self.no_proxy
        )
    }
}

/// `proxies.default` entry of the Docker client config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientProxyDetails {
    #[serde(rename = "httpProxy")]
    pub http: Option<String>,
    #[serde(rename = "httpsProxy")]
    pub https: Option<String>,
    #[serde(rename = "noProxy")]
    pub no_proxy: Option<String>,
}

impl ClientProxyDetails {
    fn from_proxies(proxies: &Value) -> Self {
        let field = |key: &str| {
            proxies
                .get("default")
                .and_then(|default| default.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        ClientProxyDetails {
            http: field("httpProxy"),
            https: field("httpsProxy"),
            no_proxy: field("noProxy"),
        }
    }
}

impl From<&ProxySettings> for ClientProxyDetails {
    fn from(settings: &ProxySettings) -> Self {
        ClientProxyDetails {
            http: Some(settings.http.clone()),
            https: Some(settings.https.clone()),
            no_proxy: Some(settings.no_proxy.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Enabled(ClientProxyDetails),
    Disabled,
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonDetails {
    /// The `Environment=` lines of the drop-in.
    Environment(Vec<String>),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonState {
    Enabled(DaemonDetails),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub client: ClientState,
    pub daemon: DaemonState,
}

/// Result of a removal that tolerates a missing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Removed,
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonOutcome {
    Applied,
    RestartFailed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub client: bool,
    pub daemon: DaemonOutcome,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.client
    }
}

/// Locations of the two proxy surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerPaths {
    pub client_config_dir: PathBuf,
    pub daemon_dropin_dir: PathBuf,
}

impl DockerPaths {
    /// `client_config_dir` falls back to `~/.docker`.
    pub fn resolve(client_config_dir: Option<PathBuf>, daemon_dropin_dir: PathBuf) -> Result<Self> {
        let client_config_dir = match client_config_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| ToolError::Config("cannot determine home directory".into()))?
                .join(".docker"),
        };

        log::debug!(
            "docker client config: {}, daemon drop-in: {}",
            client_config_dir.display(),
            daemon_dropin_dir.display()
        );

        Ok(DockerPaths {
            client_config_dir,
            daemon_dropin_dir,
        })
    }

    pub fn client_config_file(&self) -> PathBuf {
        self.client_config_dir.join(CLIENT_CONFIG_FILE)
    }

    pub fn daemon_proxy_file(&self) -> PathBuf {
        self.daemon_dropin_dir.join(DAEMON_PROXY_FILE)
    }
}

pub struct DockerProxyManager<R, P> {
    paths: DockerPaths,
    settings: ProxySettings,
    runner: R,
    privilege: P,
}

impl<R: CommandRunner, P: Privilege> DockerProxyManager<R, P> {
    pub fn new(paths: DockerPaths, settings: ProxySettings, runner: R, privilege: P) -> Self {
        DockerProxyManager {
            paths,
            settings,
            runner,
            privilege,
        }
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    fn require_privilege(&self, action: &str) -> Result<()> {
        if self.privilege.is_elevated() {
            Ok(())
        } else {
            Err(ToolError::Permission(format!(
                "root privileges required to {action}"
            )))
        }
    }

    /// `None` when the file does not exist.
    fn load_client_config(&self) -> Result<Option<Map<String, Value>>> {
        let path = self.paths.client_config_file();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ToolError::io(path, e)),
        };

        match serde_json::from_str(&content) {
            Ok(Value::Object(config)) => Ok(Some(config)),
            Ok(_) => Err(ToolError::parse(path, "top-level value is not an object")),
            Err(e) => Err(ToolError::parse(path, e)),
        }
    }

    fn store_client_config(&self, config: Map<String, Value>) -> Result<()> {
        let path = self.paths.client_config_file();
        let mut content = serde_json::to_string_pretty(&Value::Object(config))
            .map_err(|e| ToolError::parse(&path, e))?;
        content.push('\n');
        write_atomic(&path, content.as_bytes())
    }

    pub fn enable_client_proxy(&self) -> Result<()> {
        let dir = &self.paths.client_config_dir;
        fs::create_dir_all(dir).map_err(|e| ToolError::io(dir, e))?;

        let mut config = self.load_client_config()?.unwrap_or_default();
        let details = ClientProxyDetails::from(&self.settings);
        config.insert(
            "proxies".to_string(),
            serde_json::json!({ "default": details }),
        );

        self.store_client_config(config)
    }

    pub fn disable_client_proxy(&self) -> Result<Change> {
        let Some(mut config) = self.load_client_config()? else {
            return Ok(Change::NotConfigured);
        };

        let change = match config.shift_remove("proxies") {
            Some(_) => Change::Removed,
            None => Change::NotConfigured,
        };

        self.store_client_config(config)?;
        Ok(change)
    }

    pub fn enable_daemon_proxy(&self) -> Result<()> {
        self.require_privilege("write the Docker daemon proxy")?;

        let dir = &self.paths.daemon_dropin_dir;
        fs::create_dir_all(dir).map_err(|e| ToolError::io(dir, e))?;

        let path = self.paths.daemon_proxy_file();
        fs::write(&path, self.settings.daemon_unit()).map_err(|e| ToolError::io(path, e))
    }

    pub fn disable_daemon_proxy(&self) -> Result<Change> {
        self.require_privilege("remove the Docker daemon proxy")?;

        let path = self.paths.daemon_proxy_file();
        match fs::remove_file(&path) {
            Ok(()) => Ok(Change::Removed),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Change::NotConfigured),
            Err(e) => Err(ToolError::io(path, e)),
        }
    }

    pub fn restart_service(&self) -> Result<()> {
        self.require_privilege("restart the Docker service")?;

        for args in [&["daemon-reload"][..], &["restart", "docker"][..]] {
            let command = command_line("systemctl", args);
            let status = self
                .runner
                .run("systemctl", args)
                .map_err(|e| ToolError::Service {
                    command: command.clone(),
                    status: format!("spawn error: {e}"),
                })?;
            if !status.success() {
                return Err(ToolError::Service {
                    command,
                    status: status.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            client: self.client_state(),
            daemon: self.daemon_state(),
        }
    }

    fn client_state(&self) -> ClientState {
        match self.load_client_config() {
            Ok(Some(config)) => match config.get("proxies") {
                Some(proxies) if proxies.is_object() => {
                    ClientState::Enabled(ClientProxyDetails::from_proxies(proxies))
                }
                Some(_) => {
                    log::warn!("reading client config: `proxies` is not an object");
                    ClientState::Unreadable("`proxies` is not an object".into())
                }
                None => ClientState::Disabled,
            },
            Ok(None) => ClientState::Disabled,
            Err(e) => {
                log::warn!("reading client config: {e}");
                ClientState::Unreadable(e.to_string())
            }
        }
    }

    fn daemon_state(&self) -> DaemonState {
        let path = self.paths.daemon_proxy_file();
        match fs::read_to_string(&path) {
            Ok(content) => DaemonState::Enabled(DaemonDetails::Environment(
                content
                    .lines()
                    .filter(|line| line.starts_with("Environment="))
                    .map(str::to_string)
                    .collect(),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => DaemonState::Disabled,
            Err(e) => {
                let e = ToolError::io(path, e);
                log::warn!("reading daemon proxy: {e}");
                DaemonState::Enabled(DaemonDetails::Unreadable(e.to_string()))
            }
        }
    }

    pub fn enable_proxy(&self) -> Outcome {
        output::header("Enabling Docker Proxy");

        let client = match self.enable_client_proxy() {
            Ok(()) => {
                output::success("Docker client proxy enabled");
                true
            }
            Err(e) => {
                output::failure(format!("Failed to enable Docker client proxy: {e}"));
                false
            }
        };

        let daemon = self.daemon_step(|manager| match manager.enable_daemon_proxy() {
            Ok(()) => {
                output::success("Docker daemon proxy enabled");
                true
            }
            Err(e) => {
                output::failure(format!("Failed to enable Docker daemon proxy: {e}"));
                false
            }
        });

        if client {
            output::banner("Docker proxy enabled successfully!", true);
        } else {
            output::banner("Failed to enable Docker proxy", false);
        }

        Outcome { client, daemon }
    }

    pub fn disable_proxy(&self) -> Outcome {
        output::header("Disabling Docker Proxy");

        let client = match self.disable_client_proxy() {
            Ok(Change::Removed) => {
                output::success("Docker client proxy disabled");
                true
            }
            Ok(Change::NotConfigured) => {
                output::success("Docker client proxy not configured, no need to disable");
                true
            }
            Err(e) => {
                output::failure(format!("Failed to disable Docker client proxy: {e}"));
                false
            }
        };

        let daemon = self.daemon_step(|manager| match manager.disable_daemon_proxy() {
            Ok(Change::Removed) => {
                output::success("Docker daemon proxy disabled");
                true
            }
            Ok(Change::NotConfigured) => {
                output::success("Docker daemon proxy not configured, no need to disable");
                true
            }
            Err(e) => {
                output::failure(format!("Failed to disable Docker daemon proxy: {e}"));
                false
            }
        });

        if client {
            output::banner("Docker proxy disabled successfully!", true);
        } else {
            output::banner("Failed to disable Docker proxy", false);
        }

        Outcome { client, daemon }
    }

    /// Same as [`disable_proxy`](Self::disable_proxy), framed as a reset.
    pub fn reset(&self) -> Outcome {
        output::header("Resetting Docker Proxy Configurations");
        println!("This will remove:");
        println!("- Docker client proxy configuration");
        println!("- Docker daemon proxy configuration");

        let outcome = self.disable_proxy();
        output::success("All configurations have been reset");
        outcome
    }

    /// Runs `apply` and restarts Docker when privileged, otherwise warns.
    fn daemon_step<F>(&self, apply: F) -> DaemonOutcome
    where
        F: FnOnce(&Self) -> bool,
    {
        if !self.privilege.is_elevated() {
            output::warning(PRIVILEGE_HINT);
            output::detail("Please run with sudo or configure daemon proxy manually");
            return DaemonOutcome::Skipped;
        }

        if !apply(self) {
            return DaemonOutcome::Failed;
        }

        println!("Restarting Docker service...");
        match self.restart_service() {
            Ok(()) => {
                output::success("Docker service restarted successfully");
                DaemonOutcome::Applied
            }
            Err(e) => {
                output::failure(format!("Failed to restart Docker service: {e}"));
                DaemonOutcome::RestartFailed
            }
        }
    }

    pub fn print_status(&self) -> StatusReport {
        let report = self.status();
        output::header("Docker Proxy Status");

        match &report.client {
            ClientState::Enabled(details) => {
                output::enabled("Docker client proxy");
                let na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".into());
                output::detail(format!("HTTP Proxy: {}", na(&details.http)));
                output::detail(format!("HTTPS Proxy: {}", na(&details.https)));
                output::detail(format!("No Proxy: {}", na(&details.no_proxy)));
            }
            ClientState::Disabled => output::disabled("Docker client proxy"),
            ClientState::Unreadable(_) => {
                output::unreadable("Docker client proxy", "Config file read failed")
            }
        }

        match &report.daemon {
            DaemonState::Enabled(DaemonDetails::Environment(lines)) => {
                output::enabled("Docker daemon proxy");
                output::detail("Configuration:");
                for line in lines {
                    output::detail(line);
                }
            }
            DaemonState::Enabled(DaemonDetails::Unreadable(_)) => {
                output::enabled("Docker daemon proxy");
                output::failure("Config file read failed");
            }
            DaemonState::Disabled => output::disabled("Docker daemon proxy"),
        }

        report
    }
}
