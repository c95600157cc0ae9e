use async_trait::async_trait;

use beacon_ota_domain::request::RequestRecord;

use super::{RequestSink, SinkError};

#[derive(Default)]
pub struct NoopRequestSink;

#[async_trait]
impl RequestSink for NoopRequestSink {
    async fn save(&mut self, _: &RequestRecord) -> Result<(), SinkError> {
        Ok(())
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        Ok(())
    }
}
