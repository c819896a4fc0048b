// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::signal::SignalHandler;
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state (holds the live connection counter)
/// * `signals` - Shutdown coordination
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    signals: &Arc<SignalHandler>,
) {
    // Increment first, then check, so two racing accepts can't both slip under the limit
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(signals));
}

/// Serve a single connection in a spawned task.
///
/// Header reads are bounded by `performance.read_timeout`. Between requests
/// the connection may sit idle for `keep_alive_timeout` seconds, re-armed
/// after every response; `0` disables keep-alive. On shutdown or idle expiry
/// the connection finishes its in-flight request and closes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let keep_alive = perf.keep_alive_timeout > 0;
        let idle_timeout = Duration::from_secs(perf.keep_alive_timeout);

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);
        if perf.read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(perf.read_timeout));
        }

        let activity = Arc::new(Activity::new());
        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let activity = Arc::clone(&service_activity);
                async move {
                    activity.begin();
                    let res = handler::handle_request(req, state, peer_addr).await;
                    activity.end();
                    res
                }
            }),
        );

        tokio::pin!(conn);
        let result = tokio::select! {
            res = conn.as_mut() => res,
            () = signals.wait_for_shutdown() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
            () = activity.wait_idle(idle_timeout), if keep_alive => {
                logger::log_debug(&format!(
                    "Closing idle connection from {peer_addr} after {} seconds",
                    idle_timeout.as_secs()
                ));
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Request activity on one connection, used for the keep-alive idle deadline
struct Activity {
    origin: Instant,
    /// Milliseconds after `origin` when the last request finished
    last_done_ms: AtomicU64,
    in_flight: AtomicUsize,
}

impl Activity {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_done_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_done_ms.store(elapsed, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Resolve once no request has been in flight for `idle`
    async fn wait_idle(&self, idle: Duration) {
        loop {
            let deadline = if self.in_flight.load(Ordering::SeqCst) > 0 {
                Instant::now() + idle
            } else {
                let last_done = Duration::from_millis(self.last_done_ms.load(Ordering::SeqCst));
                let deadline = self.origin + last_done + idle;
                if Instant::now() >= deadline {
                    return;
                }
                deadline
            };
            tokio::time::sleep_until(deadline).await;
        }
    }
}
