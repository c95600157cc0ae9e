use async_trait::async_trait;

use beacon_ota_domain::request::RequestRecord;

use super::{RequestSink, SinkError};

/// Forwards every record to each inner sink in turn.
///
/// All sinks are attempted even when one fails; the first error is returned.
pub struct TeeRequestSink {
    sinks: Vec<Box<dyn RequestSink>>,
}

impl TeeRequestSink {
    pub fn new(sinks: Vec<Box<dyn RequestSink>>) -> TeeRequestSink {
        TeeRequestSink { sinks }
    }
}

#[async_trait]
impl RequestSink for TeeRequestSink {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.save(record).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in self.sinks.drain(..) {
            if let Err(e) = sink.close().await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
