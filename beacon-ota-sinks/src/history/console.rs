use async_trait::async_trait;
use tracing::{error, info};

use beacon_ota_domain::request::{Outcome, RequestRecord};

use super::{RequestSink, SinkError};

/// Access log on the tracing subscriber, one event per request. This is the
/// only place a request outcome is logged.
#[derive(Default)]
pub struct ConsoleRequestSink;

#[async_trait]
impl RequestSink for ConsoleRequestSink {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        let client = record.client.ip();
        let status = record.outcome.status();
        match record.outcome {
            Outcome::NotFound | Outcome::Failed { .. } => {
                error!(%client, method = %record.method, path = %record.path, status, "{}", record.outcome);
            }
            _ => {
                info!(%client, method = %record.method, path = %record.path, status, "{}", record.outcome);
            }
        }
        Ok(())
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        Ok(())
    }
}
