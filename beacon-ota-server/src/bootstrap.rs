//! Startup checks run before the listener is bound.
//!
//! A missing firmware image never stops the server from starting: it answers
//! 404 until an operator copies a build into place.

use std::{
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
};

use anyhow::{Context, Result};
use beacon_ota_domain::firmware::ArtifactInfo;
use tracing::{info, warn};

use crate::config::ServerConfig;

#[derive(Debug, PartialEq)]
pub enum FirmwareStatus {
    Ready(ArtifactInfo),
    Missing,
    Unreadable(String),
}

#[derive(Debug, PartialEq)]
pub struct Bootstrap {
    pub created_dir: bool,
    pub firmware: FirmwareStatus,
}

pub fn bootstrap(config: &ServerConfig) -> Result<Bootstrap> {
    let dir = &config.firmware_dir;
    let created_dir = if dir.is_dir() {
        false
    } else {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating firmware directory {}", dir.display()))?;
        info!(dir = %dir.display(), "Created firmware directory");
        true
    };

    let firmware = match config.artifact().inspect() {
        Ok(info) => FirmwareStatus::Ready(info),
        Err(e) if e.kind() == ErrorKind::NotFound => FirmwareStatus::Missing,
        Err(e) => FirmwareStatus::Unreadable(e.to_string()),
    };

    Ok(Bootstrap {
        created_dir,
        firmware,
    })
}

impl Bootstrap {
    pub fn print(&self, config: &ServerConfig) {
        let path = config.artifact().path().display().to_string();
        println!("{}", "=".repeat(70));
        match &self.firmware {
            FirmwareStatus::Ready(info) => {
                println!("Firmware found");
                println!("{}", "=".repeat(70));
                println!("File: {path}");
                println!("Size: {} bytes ({:.1} KB)", info.size, info.size_kb());
            }
            FirmwareStatus::Missing => {
                warn!(%path, "Firmware file not found");
                println!("WARNING: Firmware file not found!");
                println!("{}", "=".repeat(70));
                println!("\nTo prepare firmware for OTA update:");
                println!("  1. Build firmware: idf.py build");
                println!("  2. Copy to server: cp build/BluetoothBeacon.bin {path}");
                println!("\nServer will start but updates will fail until firmware is available.");
            }
            FirmwareStatus::Unreadable(reason) => {
                warn!(%path, %reason, "Firmware file is not readable");
                println!("WARNING: Firmware file {path} is not readable: {reason}");
                println!("\nServer will start but updates will fail until this is fixed.");
            }
        }
        println!("{}", "=".repeat(70));
    }
}

/// Address beacons on the local network should use to reach `local`.
///
/// For a wildcard bind the outbound interface is found by "connecting" a UDP
/// socket, which sends no packets.
pub fn advertised_ip(local: SocketAddr) -> IpAddr {
    if !local.ip().is_unspecified() {
        return local.ip();
    }
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub fn print_banner(config: &ServerConfig, local: SocketAddr) {
    let route = config.firmware_route();
    let port = local.port();
    let lan_ip = advertised_ip(local);
    println!("\n{}", "=".repeat(70));
    println!("  ESP32 iBeacon OTA Update Server");
    println!("{}", "=".repeat(70));
    println!("\nServer running on:");
    println!("  - Local:   http://localhost:{port}{route}");
    println!("  - Network: http://{lan_ip}:{port}{route}");
    println!("\nConfigure your beacons with:");
    println!("  - menuconfig -> Firmware URL: http://{lan_ip}:{port}{route}");
    println!("\nPress Ctrl+C to stop server");
    println!("{}\n", "=".repeat(70));
}
