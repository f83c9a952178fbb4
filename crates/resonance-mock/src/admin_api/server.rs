//! Admin API server.

use crate::admin_api::router::route_request;
use crate::mock::MockServerEngine;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Admin API server
pub struct AdminApiServer {
    addr: SocketAddr,
    engine: Arc<MockServerEngine>,
}

impl AdminApiServer {
    /// Create a new admin API server
    pub fn new(addr: SocketAddr, engine: Arc<MockServerEngine>) -> Self {
        Self { addr, engine }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("Admin API listening on http://{}", listener.local_addr()?);

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let engine = Arc::clone(&self.engine);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let engine = Arc::clone(&engine);
                    async move { route_request(req, engine).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Admin API connection error: {}", e);
                }
            });
        }
    }
}
