use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use anyhow::{Result, bail};
use beacon_ota_domain::firmware::FirmwareArtifact;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FIRMWARE_DIR: &str = "firmware";
pub const DEFAULT_FIRMWARE_FILE: &str = "beacon_firmware.bin";

/// Routes the firmware file name may not shadow.
const RESERVED_NAMES: [&str; 2] = ["health", "status"];

/// Everything a server instance needs, passed in at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub firmware_dir: PathBuf,
    pub firmware_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            firmware_dir: PathBuf::from(DEFAULT_FIRMWARE_DIR),
            firmware_file: DEFAULT_FIRMWARE_FILE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn artifact(&self) -> FirmwareArtifact {
        FirmwareArtifact::locate(&self.firmware_dir, &self.firmware_file)
    }

    pub fn firmware_route(&self) -> String {
        format!("/{}", self.firmware_file)
    }

    /// The file name must be a single plain path segment inside the firmware
    /// directory, matched against request paths without percent-decoding.
    pub fn validate(&self) -> Result<()> {
        let name = self.firmware_file.as_str();
        if name.is_empty() {
            bail!("firmware file name is empty");
        }
        if name == "." || name == ".." {
            bail!("firmware file name '{name}' is not a file");
        }
        if name.contains(['/', '\\']) {
            bail!("firmware file name '{name}' must not contain path separators");
        }
        if !name.chars().all(is_plain_segment_char) {
            bail!("firmware file name '{name}' must be ASCII letters, digits, '-', '_', '.' or '~'");
        }
        if RESERVED_NAMES.contains(&name) {
            bail!("firmware file name '{name}' clashes with a built-in route");
        }
        Ok(())
    }
}

fn is_plain_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::ServerConfig;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.firmware_route(), "/beacon_firmware.bin");
        assert_eq!(
            config.artifact().path(),
            Path::new("firmware/beacon_firmware.bin")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_names_escaping_the_directory() {
        let invalid = vec![
            "",
            ".",
            "..",
            "../secret.bin",
            "nested/fw.bin",
            "win\\fw.bin",
            "status",
            "beacon fw.bin",
            "fw\"1.bin",
            "fw%41.bin",
            "prošivka.bin",
        ];

        for name in invalid {
            let config = ServerConfig {
                firmware_file: name.to_string(),
                ..ServerConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn accepts_versioned_names() {
        for name in ["beacon_firmware.bin", "beacon-v1.2.3.bin", "fw~rc1.bin"] {
            let config = ServerConfig {
                firmware_file: name.to_string(),
                ..ServerConfig::default()
            };
            assert!(config.validate().is_ok(), "rejected {name:?}");
        }
    }
}
