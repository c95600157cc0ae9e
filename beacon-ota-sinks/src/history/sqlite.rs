use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use beacon_ota_domain::request::RequestRecord;
use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};

use super::{RequestSink, SinkError};

pub struct SQLiteRequestSink {
    pool: Arc<Pool<Sqlite>>,
}

impl SQLiteRequestSink {
    pub async fn create_from_file<P>(path_arg: P) -> Result<Box<dyn RequestSink>, SinkError>
    where
        P: AsRef<Path>,
    {
        let url = format!("sqlite://{}?mode=rwc", path_arg.as_ref().display());
        let pool = Arc::new(SqlitePoolOptions::new().connect(&url).await?);
        let sink = SQLiteRequestSink::create_from_pool(pool).await?;
        Ok(Box::new(sink))
    }

    pub async fn create_from_pool(pool: Arc<Pool<Sqlite>>) -> Result<SQLiteRequestSink, SinkError> {
        sqlx::migrate!("../migrations").run(&*pool).await?;
        Ok(SQLiteRequestSink { pool })
    }
}

#[async_trait]
impl RequestSink for SQLiteRequestSink {
    async fn save(&mut self, record: &RequestRecord) -> Result<(), SinkError> {
        sqlx::query(
            "
            INSERT INTO request_records (date_time, client, method, path, status, outcome)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.date_time)
        .bind(record.client.to_string())
        .bind(&record.method)
        .bind(&record.path)
        .bind(i64::from(record.outcome.status()))
        .bind(record.outcome.to_string())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
    async fn close(mut self: Box<Self>) -> Result<(), SinkError> {
        self.pool.close().await;
        Ok(())
    }
}
