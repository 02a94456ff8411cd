use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;

fn default_socket_path() -> String {
    "/usr/socket/storage-quota-plugin.sock".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the registered storage backend this process serves.
    pub storage_name: String,
    /// Unix socket the gRPC server binds.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    // quota server connection
    pub ip: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Filesystem name on the backend storage, used in quota paths.
    pub filesystem_name: String,
    /// Absolute root directory on the backend storage.
    pub root_path: String,
}

pub fn load_config(path: &str) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config from {path}"))?;
    let cfg: Config = serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    /// Required fields must be set; the deployment tooling writes "None" for
    /// values it has no answer for, which counts as unset.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("storage_name", &self.storage_name),
            ("ip", &self.ip),
            ("username", &self.username),
            ("password", &self.password),
            ("filesystem_name", &self.filesystem_name),
            ("root_path", &self.root_path),
        ] {
            if value.is_empty() || value == "None" {
                bail!("config field {name} must be set");
            }
        }
        if self.port == 0 {
            bail!("config field port must be set");
        }
        if self.socket_path.is_empty() {
            bail!("config field socket_path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            storage_name: "parastor".to_string(),
            socket_path: default_socket_path(),
            ip: "10.0.0.7".to_string(),
            port: 6666,
            username: "admin".to_string(),
            password: "secret".to_string(),
            filesystem_name: "fsA".to_string(),
            root_path: "/data".to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn placeholder_values_are_fatal() {
        let mut cfg = sample();
        cfg.password = "None".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = sample();
        cfg.ip = String::new();
        assert!(cfg.validate().is_err());

        let mut cfg = sample();
        cfg.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_with_default_socket() {
        let yaml = r#"
storage_name: parastor
ip: 10.0.0.7
port: 6666
username: admin
password: secret
filesystem_name: fsA
root_path: /data
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.socket_path, default_socket_path());
        assert_eq!(cfg.port, 6666);
        cfg.validate().unwrap();
    }
}
