use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::connection::{HttpConnection, Outcome, PipelinePool};
use crate::handler::Handler;

/// A socket the dispatcher can wait on without reading from it.
pub trait Transport: AsyncRead + AsyncWrite + Unpin {
    /// Resolves once the socket is readable, possibly spuriously.
    fn readable(&self) -> impl Future<Output = io::Result<()>>;
}

impl Transport for TcpStream {
    fn readable(&self) -> impl Future<Output = io::Result<()>> {
        TcpStream::readable(self)
    }
}

/// The idle waiting point shared by every connection of a server.
///
/// A connection waits here between requests. Once its socket turns readable
/// the dispatcher binds a pipeline instance from the pool to it, lets the
/// pipeline run one request/response cycle, and takes the connection back if
/// it persists. The dispatcher never reads or writes the socket itself.
#[derive(Debug)]
pub struct IdleDispatcher<H> {
    pool: PipelinePool,
    handler: H,
    idle_timeout: Option<Duration>,
}

impl<H> IdleDispatcher<H>
where
    H: Handler,
{
    pub fn new(pool: PipelinePool, handler: H) -> Self {
        Self { pool, handler, idle_timeout: None }
    }

    /// Closes connections whose next request does not turn readable in time.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[inline]
    pub fn pool(&self) -> &PipelinePool {
        &self.pool
    }

    /// Serves `connection` until a cycle closes it.
    pub async fn serve<T>(&self, mut connection: HttpConnection<T>)
    where
        T: Transport,
    {
        loop {
            // residual bytes may already hold the next request
            if !connection.has_residual()
                && let Err(e) = self.wait_readable(&connection).await
            {
                debug!(cause = %e, "connection went idle");
                break;
            }

            let mut pipeline = match self.pool.acquire().await {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    warn!(cause = %e, "can't acquire pipeline instance");
                    break;
                }
            };

            let outcome = pipeline.run(&mut connection, &self.handler).await;
            drop(pipeline);

            if outcome == Outcome::Close {
                break;
            }
        }
        trace!("connection closed");
    }

    async fn wait_readable<T>(&self, connection: &HttpConnection<T>) -> io::Result<()>
    where
        T: Transport,
    {
        match self.idle_timeout {
            Some(idle_timeout) => tokio::time::timeout(idle_timeout, connection.io().readable()).await?,
            None => connection.io().readable().await,
        }
    }
}
