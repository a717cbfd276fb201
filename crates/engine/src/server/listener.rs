use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::info;

use crate::server::ServerError;

/// Listen queue length used unless configured otherwise.
pub const DEFAULT_BACKLOG: i32 = 32768;

/// Creates the non-blocking listening socket and registers it with the
/// reactor.
///
/// Address reuse is enabled, linger and Nagle's algorithm are disabled. Every
/// failure is fatal and names the syscall that failed.
///
/// Must be called from within a tokio runtime.
pub fn start_listening(address: SocketAddr, backlog: i32) -> Result<TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| ServerError::setup("socket", e))?;

    socket.set_reuse_address(true).map_err(|e| ServerError::setup("setsockopt(SO_REUSEADDR)", e))?;
    socket.set_nodelay(true).map_err(|e| ServerError::setup("setsockopt(TCP_NODELAY)", e))?;
    socket.set_linger(None).map_err(|e| ServerError::setup("setsockopt(SO_LINGER)", e))?;
    socket.set_nonblocking(true).map_err(|e| ServerError::setup("fcntl(O_NONBLOCK)", e))?;

    socket.bind(&address.into()).map_err(|e| ServerError::setup("bind", e))?;
    socket.listen(backlog).map_err(|e| ServerError::setup("listen", e))?;

    let listener = TcpListener::from_std(socket.into()).map_err(|e| ServerError::setup("epoll_ctl", e))?;

    info!(%address, backlog, "listening");
    Ok(listener)
}
