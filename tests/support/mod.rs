// One-time server bootstrap shared by the integration tests.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use file_uploader::{server, AppState, Config, SignalHandler};

static SERVER_URL: OnceLock<String> = OnceLock::new();

/// Start the server once per test binary and return its base URL.
pub fn ensure_server() -> &'static str {
    SERVER_URL.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);

        // Own thread + runtime so the server outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let mut config = Config::load_from("no-such-config-file").expect("default config");
                config.logging.access_log = false;

                let listener = server::create_reusable_listener("127.0.0.1:0".parse().unwrap())
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{addr}"));

                let state = Arc::new(AppState::new(&config));
                let signals = Arc::new(SignalHandler::new());
                server::serve(listener, state, signals)
                    .await
                    .expect("server failed");
            });
        });

        wait_for_readiness(&published_url)
    })
}

fn wait_for_readiness(published_url: &OnceLock<String>) -> String {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return base_url;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
