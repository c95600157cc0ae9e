use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a single request was answered.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub enum Outcome {
    Served { bytes: u64 },
    NotModified,
    NotFound,
    Failed { reason: String },
    Rejected { status: u16 },
}

impl Outcome {
    pub fn status(&self) -> u16 {
        use Outcome::{Failed, NotFound, NotModified, Rejected, Served};
        match self {
            Served { .. } => 200,
            NotModified => 304,
            NotFound => 404,
            Failed { .. } => 500,
            Rejected { status } => *status,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Outcome::{Failed, NotFound, NotModified, Rejected, Served};
        match self {
            Served { bytes } => write!(f, "served {bytes} bytes"),
            NotModified => write!(f, "not modified"),
            NotFound => write!(f, "firmware not found"),
            Failed { reason } => write!(f, "failed: {reason}"),
            Rejected { status } => write!(f, "rejected ({status})"),
        }
    }
}

/// One request/response cycle, kept only long enough to be logged.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct RequestRecord {
    pub date_time: DateTime<Utc>,
    pub client: SocketAddr,
    pub method: String,
    pub path: String,
    pub outcome: Outcome,
}

impl RequestRecord {
    #[must_use]
    pub fn new(
        date_time: DateTime<Utc>,
        client: SocketAddr,
        method: &str,
        path: &str,
        outcome: Outcome,
    ) -> RequestRecord {
        RequestRecord {
            date_time,
            client,
            method: method.to_string(),
            path: path.to_string(),
            outcome,
        }
    }
}

impl std::fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} - {} {} {}",
            self.date_time.format("%Y-%m-%d %H:%M:%S"),
            self.client.ip(),
            self.method,
            self.path,
            self.outcome
        )
    }
}
