//! Test server harness for E2E testing
//!
//! Provides `TestApiServer`: the real router on an ephemeral port, backed by
//! `InMemoryArbitrageStore`, with a `wiremock` server standing in for the
//! identity provider's JWKS endpoint.

use crate::token_builder::{TestSigner, TEST_AUDIENCE};
use arbitrage_api::auth::JwksClient;
use arbitrage_api::config::Config;
use arbitrage_api::observability::metrics::init_metrics_recorder;
use arbitrage_api::repositories::InMemoryArbitrageStore;
use arbitrage_api::routes::{self, AppState};
use arbitrage_api::services::ArbitrageGateway;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Global metrics handle for test servers.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// The global recorder can be installed once per process; later servers
/// share its handle, or fall back to a detached recorder.
fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Arbitrage API in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_flow() -> Result<()> {
///     let server = TestApiServer::spawn().await?;
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/arbitrages", server.url()))
///         .bearer_auth(server.token())
///         .json(&body)
///         .send()
///         .await?;
///     assert_eq!(response.status(), 201);
///     assert_eq!(server.store().len().await, 1);
///     Ok(())
/// }
/// ```
pub struct TestApiServer {
    addr: SocketAddr,
    store: Arc<InMemoryArbitrageStore>,
    config: Config,
    signer: TestSigner,
    identity_provider: MockServer,
    _handle: JoinHandle<()>,
}

impl TestApiServer {
    /// Spawn a server with an empty in-memory store.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(InMemoryArbitrageStore::new())).await
    }

    /// Spawn a server over a caller-provided store (e.g. `InMemoryArbitrageStore::failing()`).
    ///
    /// The server will:
    /// - Serve the fixture RSA key from a mocked `/.well-known/jwks.json`
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_store(
        store: Arc<InMemoryArbitrageStore>,
    ) -> Result<Self, anyhow::Error> {
        let identity_provider = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "keys": [TestSigner::jwk()] })),
            )
            .mount(&identity_provider)
            .await;

        let vars = HashMap::from([
            (
                "MONGO_DB_URI".to_string(),
                "mongodb://localhost:27017".to_string(),
            ),
            ("AUTH0_DOMAIN".to_string(), identity_provider.uri()),
            ("AUTH0_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("DRAIN_SECONDS".to_string(), "0".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let signer = TestSigner::new(config.issuer.clone(), config.audience.clone());
        let jwks_client = Arc::new(JwksClient::new(config.jwks_url.clone()));

        let state = Arc::new(AppState {
            gateway: ArbitrageGateway::new(store.clone()),
            config: config.clone(),
            jwks_client,
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            signer,
            identity_provider,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The store behind the server, for asserting on persisted state.
    pub fn store(&self) -> &Arc<InMemoryArbitrageStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Signer whose tokens this server accepts.
    pub fn signer(&self) -> &TestSigner {
        &self.signer
    }

    /// A valid bearer token for this server.
    pub fn token(&self) -> String {
        self.signer.valid_token()
    }

    /// Requests the mocked identity provider has received so far.
    pub async fn identity_provider_requests(&self) -> usize {
        self.identity_provider
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
