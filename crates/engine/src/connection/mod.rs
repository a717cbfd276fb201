//! Connection lifecycle between the listener and the handler.
//!
//! # Components
//!
//! - [`HttpConnection`]: an accepted socket plus the bytes read past its
//!   last request
//! - [`Pipeline`]: the per-cycle protocol state machine, reading, framing,
//!   dispatching to the handler and writing the response
//! - [`PipelinePool`]: supplies and reclaims pipeline instances, bounded by
//!   a memory derived ceiling
//! - [`IdleDispatcher`]: the waiting point a connection returns to between
//!   requests; binds a pooled pipeline to it once it turns readable
//!
//! A connection is owned by exactly one task at a time. Everything shared
//! between connections (the pool and the handler) is reached through the
//! dispatcher on a single thread.

mod dispatcher;
mod http_connection;
mod pipeline;
mod pool;

pub use dispatcher::{IdleDispatcher, Transport};
pub use http_connection::HttpConnection;
pub use pipeline::{DEFAULT_BUFFER_SIZE, Outcome, Pipeline, PipelineConfig};
pub use pool::{FALLBACK_CAPACITY, PipelinePool, PooledPipeline, system_capacity};
