use crate::error::ConfigError;

pub const DEFAULT_NAME: &str = "Unnamed Server";

pub const USAGE: &str =
    "Usage: line-chat-server port:<port number> [adminPass:<admin password>] [name:<server name>]";

/// Server-wide settings.
///
/// `name` and `admin_password` are the only fields that matter after
/// startup; `name` can be changed by an admin at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    pub name: String,
    /// Empty means remote administration is disabled outright.
    pub admin_password: String,
}

/// The builder accumulates optional values and produces a config.
pub struct ServerConfigBuilder {
    addr: String,
    port: u16,
    name: String,
    admin_password: String,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            addr: "0.0.0.0".to_string(),
            port: 0,
            name: DEFAULT_NAME.to_string(),
            admin_password: String::new(),
        }
    }

    /// Parse `key:value` command line arguments.
    ///
    /// Recognized keys are `port` (required), `adminPass` and `name`. The
    /// value is everything after the first `:`, so names may contain colons.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Self::builder();
        let mut port = None;

        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .split_once(':')
                .ok_or_else(|| ConfigError::Malformed(arg.to_string()))?;

            match key {
                "port" => {
                    let parsed = value
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort(value.to_string()))?;
                    port = Some(parsed);
                }
                "adminPass" => builder = builder.admin_password(value),
                "name" => builder = builder.name(value),
                _ => return Err(ConfigError::UnknownOption(key.to_string())),
            }
        }

        let port = port.ok_or(ConfigError::MissingPort)?;
        Ok(builder.port(port).build())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn admin_enabled(&self) -> bool {
        !self.admin_password.is_empty()
    }
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = password.into();
        self
    }

    pub fn build(self) -> ServerConfig {
        ServerConfig {
            addr: self.addr,
            port: self.port,
            name: self.name,
            admin_password: self.admin_password,
        }
    }
}
