//! The single firmware image offered to beacons.

use std::{
    fs::Metadata,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Location of the firmware image on disk.
///
/// The file is owned by the operator: it is replaced out-of-band and only
/// ever read here, so nothing about it is cached between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareArtifact {
    name: String,
    path: PathBuf,
}

/// What `inspect` found at the artifact path.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArtifactInfo {
    pub file: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// The image contents together with the metadata of the handle they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareImage {
    pub info: ArtifactInfo,
    pub bytes: Vec<u8>,
}

impl ArtifactInfo {
    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }
}

impl FirmwareArtifact {
    #[must_use]
    pub fn locate<P>(dir: P, file: &str) -> FirmwareArtifact
    where
        P: AsRef<Path>,
    {
        FirmwareArtifact {
            name: file.to_string(),
            path: dir.as_ref().join(file),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stats the file. Absence is reported as `io::ErrorKind::NotFound`.
    ///
    /// Blocking; meant for startup. Request handlers use [`Self::stat`].
    pub fn inspect(&self) -> io::Result<ArtifactInfo> {
        let metadata = std::fs::metadata(&self.path)?;
        self.describe(&metadata)
    }

    pub async fn stat(&self) -> io::Result<ArtifactInfo> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        self.describe(&metadata)
    }

    /// Reads the whole image through one handle, so `info` describes exactly
    /// the bytes returned even if the file is replaced meanwhile.
    pub async fn read(&self) -> io::Result<FirmwareImage> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        let info = self.describe(&file.metadata().await?)?;
        let mut bytes = Vec::with_capacity(info.size as usize);
        file.read_to_end(&mut bytes).await?;
        Ok(FirmwareImage {
            info: ArtifactInfo {
                size: bytes.len() as u64,
                ..info
            },
            bytes,
        })
    }

    fn describe(&self, metadata: &Metadata) -> io::Result<ArtifactInfo> {
        if !metadata.is_file() {
            return Err(io::Error::other(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        Ok(ArtifactInfo {
            file: self.name.clone(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
