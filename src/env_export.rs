use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use serde_yaml_ng::Value;

use crate::error::{Result, ToolError};

const NO_PROXY: &str = "localhost,127.0.0.1,::1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyPorts {
    pub http: u16,
    pub socks: u16,
}

impl ProxyPorts {
    pub fn http_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.http)
    }

    pub fn socks_url(&self) -> String {
        format!("socks5://127.0.0.1:{}", self.socks)
    }
}

/// Reads `port` and `socks-port` from a Clash config.
pub fn load_ports(path: &Path) -> Result<ProxyPorts> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolError::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
        Err(e) => return Err(ToolError::io(path, e)),
    };

    let config: Value =
        serde_yaml_ng::from_str(&content).map_err(|e| ToolError::parse(path, e))?;

    match (port_field(&config, "port"), port_field(&config, "socks-port")) {
        (Some(http), Some(socks)) => Ok(ProxyPorts { http, socks }),
        _ => Err(ToolError::Config("Invalid ports in config file".into())),
    }
}

/// Accepts a non-zero integer or numeric string; anything else counts as unset.
fn port_field(config: &Value, key: &str) -> Option<u16> {
    let port = match config.get(key)? {
        Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (port != 0).then_some(port)
}

/// Wraps `value` in single quotes for POSIX shells.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn export_lines(ports: &ProxyPorts) -> Vec<String> {
    let http = ports.http_url();
    let socks = ports.socks_url();

    let mut lines: Vec<String> = [
        ("http_proxy", http.as_str()),
        ("https_proxy", http.as_str()),
        ("HTTP_PROXY", http.as_str()),
        ("HTTPS_PROXY", http.as_str()),
        ("all_proxy", socks.as_str()),
        ("ALL_PROXY", socks.as_str()),
        ("no_proxy", NO_PROXY),
        ("NO_PROXY", NO_PROXY),
    ]
    .iter()
    .map(|(key, value)| format!("export {key}={}", shell_quote(value)))
    .collect();

    lines.push(format!(
        "echo {}",
        shell_quote(&format!(
            "✅ Proxy environment variables set: HTTP/HTTPS: {http}, SOCKS: {socks}"
        ))
    ));
    lines
}

pub fn error_line(error: &ToolError) -> String {
    format!("echo {} >&2", shell_quote(&format!("❌ Error: {error}")))
}

/// Prints the export script for `config_file` to `out`. On failure only the
/// error echo is written and the error is returned.
pub fn write_exports(config_file: &Path, out: &mut impl Write) -> io::Result<Option<ToolError>> {
    match load_ports(config_file) {
        Ok(ports) => {
            log::debug!("exporting ports {ports:?} from {}", config_file.display());
            for line in export_lines(&ports) {
                writeln!(out, "{line}")?;
            }
            Ok(None)
        }
        Err(e) => {
            writeln!(out, "{}", error_line(&e))?;
            Ok(Some(e))
        }
    }
}
