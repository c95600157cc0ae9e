use std::io::Write;

use async_trait::async_trait;

use beacon_ota_domain::request::RequestRecord;

use super::{RequestSink, SinkError};

pub struct JsonLinesRequestSink<'a> {
    writer: Box<dyn Write + Send + 'a>,
}

impl<'a> JsonLinesRequestSink<'a> {
    pub fn create_from_writer(writer: Box<dyn Write + Send + 'a>) -> JsonLinesRequestSink<'a> {
        JsonLinesRequestSink { writer }
    }
}

#[async_trait]
impl<'a> RequestSink for JsonLinesRequestSink<'a> {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        let w = &mut self.writer;
        serde_json::to_writer(&mut *w, record)?;
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
