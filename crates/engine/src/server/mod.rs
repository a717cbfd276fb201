//! Listening socket setup and the accept loop.
//!
//! A [`Server`] is configured through [`Server::builder`], bound with
//! [`ServerBuilder::bind`] and driven by [`Server::run`]:
//!
//! ```no_run
//! use std::convert::Infallible;
//! use http::StatusCode;
//! use micro_engine::handler::make_handler;
//! use micro_engine::server::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = make_handler(|_request, response| {
//!         response.status(StatusCode::OK).body("ok");
//!         Ok::<(), Infallible>(())
//!     });
//!
//!     Server::builder().port(8080).bind(handler)?.run().await;
//!     Ok(())
//! }
//! ```
//!
//! Every connection is served by a task spawned on a [`LocalSet`], so the
//! whole server runs on the thread that called `run`.

mod error;
mod listener;

pub use error::ServerError;
pub use listener::{DEFAULT_BACKLOG, start_listening};

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::LocalSet;
use tracing::{debug, info};

use crate::connection::{HttpConnection, IdleDispatcher, PipelineConfig, PipelinePool, system_capacity};
use crate::handler::Handler;

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<SocketAddr>,
    backlog: i32,
    pool_capacity: Option<usize>,
    pipeline: PipelineConfig,
    idle_timeout: Option<Duration>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            address: None,
            backlog: DEFAULT_BACKLOG,
            pool_capacity: None,
            pipeline: PipelineConfig::default(),
            idle_timeout: None,
        }
    }

    pub fn address(mut self, address: impl Into<SocketAddr>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Listens on every IPv4 interface at `port`.
    pub fn port(self, port: u16) -> Self {
        self.address(([0, 0, 0, 0], port))
    }

    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Overrides the pipeline pool ceiling derived from physical memory.
    pub fn pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = Some(pool_capacity);
        self
    }

    /// Initial size and growth increment of each pipeline buffer.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.pipeline.buffer_size = buffer_size;
        self
    }

    /// Largest request, head and body together, that is accepted.
    pub fn max_request_size(mut self, max_request_size: usize) -> Self {
        self.pipeline.max_request_size = max_request_size;
        self
    }

    /// Closes connections that stay silent this long between requests.
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    /// Starts listening and sizes the pipeline pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind<H>(self, handler: H) -> Result<Server<H>, ServerError>
    where
        H: Handler,
    {
        let address = self.address.ok_or(ServerError::MissingAddress)?;
        let listener = start_listening(address, self.backlog)?;

        let capacity = self.pool_capacity.unwrap_or_else(system_capacity);
        let pool = PipelinePool::new(capacity, self.pipeline);
        info!(
            initial = 0,
            grow = pool.capacity(),
            buffer_size = self.pipeline.buffer_size,
            max_request_size = self.pipeline.max_request_size,
            "pipeline pool sized"
        );

        let dispatcher = IdleDispatcher::new(pool, handler).with_idle_timeout(self.idle_timeout);
        Ok(Server { listener, dispatcher: Rc::new(dispatcher) })
    }
}

/// A bound server, ready to accept connections.
#[derive(Debug)]
pub struct Server<H> {
    listener: TcpListener,
    dispatcher: Rc<IdleDispatcher<H>>,
}

impl Server<()> {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<H> Server<H>
where
    H: Handler + 'static,
{
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|e| ServerError::setup("getsockname", e))
    }

    /// Runs the accept loop; never returns.
    pub async fn run(self) {
        LocalSet::new().run_until(self.accept_loop()).await;
    }

    async fn accept_loop(self) {
        loop {
            let (stream, remote_addr) = match self.listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    debug!(cause = %e, "failed to accept");
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!(cause = %e, %remote_addr, "failed to disable nagle on accepted socket");
            }

            let dispatcher = Rc::clone(&self.dispatcher);
            tokio::task::spawn_local(async move {
                dispatcher.serve(HttpConnection::new(stream)).await;
            });
        }
    }
}
