pub mod console;
pub mod jsonl;
pub mod memory;
pub mod noop;
pub mod sqlite;
pub mod tee;

use std::{
    error::Error,
    ffi::OsStr,
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use beacon_ota_domain::request::RequestRecord;

use crate::history::{jsonl::JsonLinesRequestSink, sqlite::SQLiteRequestSink};

pub type SinkError = Box<dyn Error + Send + Sync>;

/// Destination for request records. Called once per handled request.
#[async_trait]
pub trait RequestSink: Send {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError>;
    async fn close(mut self: Box<Self>) -> Result<(), SinkError>;
}

#[derive(PartialEq, Debug)]
#[allow(non_camel_case_types)]
pub enum RequestSinkFormat {
    SQLITE(PathBuf),
    JSONL(PathBuf),
}

impl RequestSinkFormat {
    pub fn create_from_file<P>(path_arg: P) -> Result<RequestSinkFormat, SinkError>
    where
        P: AsRef<Path>,
    {
        let path = path_arg.as_ref();
        match path.extension().and_then(OsStr::to_str) {
            Some("sqlite") => Ok(RequestSinkFormat::SQLITE(path.to_path_buf())),
            Some("jsonl") => Ok(RequestSinkFormat::JSONL(path.to_path_buf())),
            _ => Err(format!("unknown type: {}", path.display()).into()),
        }
    }

    pub async fn to_sink(&self) -> Result<Box<dyn RequestSink>, SinkError> {
        use RequestSinkFormat::*;
        match self {
            SQLITE(path_buf) => SQLiteRequestSink::create_from_file(path_buf).await,
            JSONL(path_buf) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path_buf)?;
                Ok(Box::new(JsonLinesRequestSink::create_from_writer(
                    Box::new(file),
                )))
            }
        }
    }
}
