use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use beacon_ota_domain::request::RequestRecord;

use super::{RequestSink, SinkError};

/// Keeps records in memory. Clones share the same buffer, so a handle can be
/// kept to inspect what a running server recorded.
#[derive(Default, Clone)]
pub struct MemoryRequestSink {
    records: Arc<Mutex<Vec<RequestRecord>>>,
}

impl MemoryRequestSink {
    pub fn records(&self) -> Vec<RequestRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RequestSink for MemoryRequestSink {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|e| e.to_string())?
            .push(record.clone());
        Ok(())
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        Ok(())
    }
}
