// Server loop module
// Accepts connections until shutdown, then drains live connections

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on `listener` until `signals` requests shutdown.
///
/// After shutdown the listener is closed immediately; live connections get
/// up to `performance.shutdown_grace` seconds to finish.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &signals);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.wait_for_shutdown() => break,
        }
    }

    drop(listener);
    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    let remaining = drain_connections(&state, grace).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

/// Wait until no connections remain or `grace` elapses; returns the count left
async fn drain_connections(state: &AppState, grace: Duration) -> usize {
    logger::log_shutdown_started(state.connection_count());

    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let active = state.connection_count();
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::Ordering;

    fn test_state(grace: u64) -> Arc<AppState> {
        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.logging.access_log = false;
        config.performance.shutdown_grace = grace;
        Arc::new(AppState::new(&config))
    }

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let state = test_state(5);
        assert_eq!(drain_connections(&state, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let state = test_state(0);
        state.active_connections.fetch_add(2, Ordering::SeqCst);
        assert_eq!(drain_connections(&state, Duration::from_millis(60)).await, 2);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let state = test_state(1);
        let signals = Arc::new(SignalHandler::new());

        let server = tokio::spawn(serve(listener, state, Arc::clone(&signals)));
        signals.request_shutdown();

        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}
