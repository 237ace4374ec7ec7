use std::str::FromStr;
use std::time::Duration;
use vicemon::constants::DEFAULT_MONITOR_PORT;

pub const DEFAULT_MONITOR_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_MONITOR_HOST: &str = "VICE_MONITOR_HOST";
pub const ENV_MONITOR_PORT: &str = "VICE_MONITOR_PORT";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "VICE_CONNECT_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "VICE_REQUEST_TIMEOUT_MS";

/// Where the monitor listens and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,

    /// Upper bound on establishing the TCP connection.
    pub connect_timeout: Duration,

    /// Upper bound on waiting for a single response once its request has been
    /// written. Expiry abandons the request, not the connection.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MONITOR_HOST.to_string(),
            port: DEFAULT_MONITOR_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Default timeouts against `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    /// Defaults, overridden by any of `VICE_MONITOR_HOST`, `VICE_MONITOR_PORT`,
    /// `VICE_CONNECT_TIMEOUT_MS` and `VICE_REQUEST_TIMEOUT_MS` that are set.
    ///
    /// A variable that does not parse is ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_MONITOR_HOST) {
            let host = host.trim();
            if host.is_empty() {
                tracing::warn!(variable = ENV_MONITOR_HOST, "Ignoring empty host override");
            } else {
                config.host = host.to_string();
            }
        }

        if let Some(port) = parse_override::<u16>(&lookup, ENV_MONITOR_PORT) {
            config.port = port;
        }

        if let Some(ms) = parse_override::<u64>(&lookup, ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_override::<u64>(&lookup, ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = Duration::from_millis(ms);
        }

        config
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;

    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_MONITOR_HOST, "vice.local"),
            (ENV_MONITOR_PORT, "not-a-port"),
            (ENV_REQUEST_TIMEOUT_MS, "250"),
        ]);

        let config = ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.host, "vice.local");
        assert_eq!(config.port, DEFAULT_MONITOR_PORT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.address(), "vice.local:6502");
    }
}
