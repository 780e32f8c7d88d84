//! Shared helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use nova_client::config::IdMode;
use nova_client::observability::MemoryLog;
use nova_client::resilience::{Backoff, Retrier, RetryPolicy};
use nova_client::testservices::{Nova, SimulatedServer};
use nova_client::transport::{HttpTransport, RouterTransport};
use nova_client::{NovaClient, MAX_SEND_ATTEMPTS};

/// Both identifier schemes, for tests that must hold in either.
pub const ID_MODES: [IdMode; 2] = [IdMode::Numeric, IdMode::String];

/// A client and the service it talks to, plus the retry log sink.
#[allow(dead_code)]
pub struct Harness<T> {
    pub nova: Arc<Nova>,
    pub client: NovaClient<T>,
    pub log: Arc<MemoryLog>,
}

/// Retrier with the default ceiling and no real waiting.
pub fn fast_retrier(log: Arc<MemoryLog>) -> Retrier {
    Retrier::new(RetryPolicy::new(MAX_SEND_ATTEMPTS, Backoff::none())).with_log(log)
}

/// In-process client over a fresh service.
#[allow(dead_code)]
pub fn in_process(id_mode: IdMode) -> Harness<RouterTransport> {
    let nova = Arc::new(Nova::with_id_mode(id_mode));
    let log = Arc::new(MemoryLog::new());
    let client = NovaClient::in_process(nova.clone(), fast_retrier(log.clone()));
    Harness { nova, client, log }
}

/// Start a live service on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(id_mode: IdMode) -> SimulatedServer {
    SimulatedServer::bind("127.0.0.1:0", Arc::new(Nova::with_id_mode(id_mode)))
        .await
        .unwrap()
}

/// HTTP client for `server` with the given policy.
#[allow(dead_code)]
pub fn http_client(
    server: &SimulatedServer,
    policy: RetryPolicy,
) -> (NovaClient<HttpTransport>, Arc<MemoryLog>) {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let transport = HttpTransport::with_client(client, &server.endpoint()).unwrap();
    let log = Arc::new(MemoryLog::new());
    let retrier = Retrier::new(policy).with_log(log.clone());
    (NovaClient::new(transport, retrier), log)
}
