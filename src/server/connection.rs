// Connection module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::{AppState, Config};
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Upper bound for one connection, keep-alive reuse included.
///
/// With the object store enabled a connection may carry a whole upload or
/// download, so `objects.transfer_timeout` raises the bound.
pub fn connection_deadline(config: &Config) -> Duration {
    let performance = &config.performance;
    let mut secs = std::cmp::max(performance.read_timeout, performance.write_timeout);
    if config.objects.enabled {
        secs = std::cmp::max(secs, config.objects.transfer_timeout);
    }
    Duration::from_secs(secs)
}

/// Serve one connection in a local task.
///
/// Request heads must arrive within `read_timeout`; the connection as a whole
/// is bounded by [`connection_deadline`].
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = connection_deadline(&state.config);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout))
            .keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(objects_enabled: bool) -> Config {
        let mut config = Config::load_from("does-not-exist/config").unwrap();
        config.performance.read_timeout = 30;
        config.performance.write_timeout = 45;
        config.objects.transfer_timeout = 600;
        config.objects.enabled = objects_enabled;
        config
    }

    #[test]
    fn test_deadline_without_object_store() {
        assert_eq!(connection_deadline(&config(false)), Duration::from_secs(45));
    }

    #[test]
    fn test_deadline_covers_file_transfers() {
        assert_eq!(connection_deadline(&config(true)), Duration::from_secs(600));

        let mut short = config(true);
        short.objects.transfer_timeout = 10;
        assert_eq!(connection_deadline(&short), Duration::from_secs(45));
    }
}
