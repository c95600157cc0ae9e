use std::{future::Future, net::SocketAddr, path::Path};

use anyhow::{Context, Result, anyhow};
use beacon_ota_domain::{request::RequestRecord, uptime::format_uptime};
use beacon_ota_sinks::history::{
    RequestSink, RequestSinkFormat, console::ConsoleRequestSink, tee::TeeRequestSink,
};
use chrono::Utc;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::{error, info};

use crate::{
    bootstrap::{bootstrap, print_banner},
    config::ServerConfig,
    routes::{AppState, router},
};

/// Records waiting for the sink before new ones are dropped.
const RECORD_QUEUE: usize = 1024;

/// A bound listener plus everything needed to answer requests on it.
pub struct OtaServer {
    listener: TcpListener,
    state: AppState,
    sink: Box<dyn RequestSink>,
    records: mpsc::Receiver<RequestRecord>,
}

impl OtaServer {
    /// Binds the listening socket. Failure here is fatal for the process;
    /// nothing is retried.
    pub async fn bind(config: &ServerConfig, sink: Box<dyn RequestSink>) -> Result<OtaServer> {
        config.validate()?;
        let addr = config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        let (tx, records) = mpsc::channel(RECORD_QUEUE);
        Ok(OtaServer {
            listener,
            state: AppState::new(config.artifact(), tx),
            sink,
            records,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until `shutdown` resolves, then lets in-flight responses finish,
    /// drains the queued records and closes the request sink.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let OtaServer {
            listener,
            state,
            sink,
            records,
        } = self;
        let started = state.started;
        let writer = tokio::spawn(write_records(sink, records));
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "starting server");

        axum::serve(
            listener,
            router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("server failed")?;

        info!(uptime = %format_uptime(started, Utc::now()), "Server stopped");
        writer.await.context("request sink task failed")?;
        Ok(())
    }
}

/// Saves records one at a time until every sender is gone. Handlers never
/// wait on this, so a slow sink cannot hold up responses.
async fn write_records(
    mut sink: Box<dyn RequestSink>,
    mut records: mpsc::Receiver<RequestRecord>,
) {
    while let Some(record) = records.recv().await {
        if let Err(err) = sink.save(&record).await {
            error!(%err, "failed to record request");
        }
    }
    if let Err(err) = sink.close().await {
        error!(%err, "failed to close request sink");
    }
}

/// The console access log, teed into a history file when one is given.
pub async fn request_sink(history: Option<&Path>) -> Result<Box<dyn RequestSink>> {
    let console: Box<dyn RequestSink> = Box::<ConsoleRequestSink>::default();
    match history {
        Some(path) => {
            let history = RequestSinkFormat::create_from_file(path)
                .map_err(|e| anyhow!(e))?
                .to_sink()
                .await
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("opening history {}", path.display()))?;
            Ok(Box::new(TeeRequestSink::new(vec![console, history])))
        }
        None => Ok(console),
    }
}

/// Bootstraps the firmware directory, binds and serves until Ctrl+C or
/// SIGTERM.
pub async fn start(config: ServerConfig, sink: Box<dyn RequestSink>) -> Result<()> {
    config.validate()?;
    let report = bootstrap(&config)?;
    report.print(&config);

    let server = OtaServer::bind(&config, sink).await?;
    print_banner(&config, server.local_addr()?);
    server.serve(shutdown_signal()).await?;

    println!("\n{}", "=".repeat(70));
    println!("Server stopped.");
    println!("{}", "=".repeat(70));
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
