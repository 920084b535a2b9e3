//! Request assembly and dispatch to the provider.

use crate::address::AddressFamily;
use crate::config::Config;
use crate::error::TransportError;
use crate::router::Operation;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Client tag sent as the `channel` parameter on every provider call.
pub const CHANNEL: &str = "rust_mcp";

/// Minimal HTTP GET capability used by the dispatcher.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` with `query`, returning the body whatever the status code.
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, TransportError>;
}

/// `reqwest`-backed transport with a fixed request timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, TransportError> {
        let response = self.client.get(url).query(query).send().await?;

        // Business errors arrive inside 200 bodies; non-2xx bodies are still
        // handed to the normalizer.
        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Provider returned non-success status");
        }

        Ok(response.text().await?)
    }
}

/// A fully resolved provider call.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub operation: Operation,
    pub ip: String,
    pub family: AddressFamily,
    pub path: &'static str,
    /// Operation parameters, `ip` included. Credentials are added at dispatch.
    pub params: Vec<(String, String)>,
}

impl LookupRequest {
    pub fn new(
        operation: Operation,
        ip: &str,
        family: AddressFamily,
        path: &'static str,
        extra: &[(&str, &str)],
    ) -> Self {
        let mut params: Vec<(String, String)> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.push(("ip".to_string(), ip.to_string()));

        Self {
            operation,
            ip: ip.to_string(),
            family,
            path,
            params,
        }
    }
}

/// Sends lookup requests to the provider with the shared credentials.
pub struct RequestDispatcher {
    config: Arc<Config>,
    transport: Arc<dyn HttpTransport>,
}

impl RequestDispatcher {
    pub fn new(config: Arc<Config>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Full URL for a provider path.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.upstream.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Query string for a request: operation params, then `key` and `channel`.
    pub fn query_for(&self, request: &LookupRequest) -> Vec<(String, String)> {
        let mut query = request.params.clone();
        query.push(("key".to_string(), self.config.api_key.clone()));
        query.push(("channel".to_string(), CHANNEL.to_string()));
        query
    }

    /// Issue one GET for the request and return the raw body.
    pub async fn dispatch(&self, request: &LookupRequest) -> Result<String, TransportError> {
        let url = self.url_for(request.path);
        debug!(
            operation = %request.operation,
            ip = %request.ip,
            family = %request.family,
            path = request.path,
            "Dispatching provider request"
        );
        self.transport.get(&url, &self.query_for(request)).await
    }

    /// Raw GET against an arbitrary URL through the same transport.
    pub async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        debug!(url = %url, "Fetching auxiliary endpoint");
        self.transport.get(url, &[]).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubTransport;
    use super::*;

    fn dispatcher(transport: Arc<StubTransport>) -> RequestDispatcher {
        RequestDispatcher::new(Arc::new(Config::new("test-key")), transport)
    }

    #[test]
    fn test_url_for_joins_cleanly() {
        let mut config = Config::new("k");
        config.upstream.base_url = "https://api.example.com/".to_string();
        let d = RequestDispatcher::new(Arc::new(config), Arc::new(StubTransport::new()));
        assert_eq!(d.url_for("ip/geo/v1/city/"), "https://api.example.com/ip/geo/v1/city/");
        assert_eq!(d.url_for("/as/info/v1/asWhois"), "https://api.example.com/as/info/v1/asWhois");
    }

    #[test]
    fn test_lookup_request_params() {
        let request = LookupRequest::new(
            Operation::Location,
            "8.8.8.8",
            AddressFamily::IPv4,
            "ip/geo/v1/city/",
            &[("coordsys", "WGS84")],
        );
        assert_eq!(
            request.params,
            vec![
                ("coordsys".to_string(), "WGS84".to_string()),
                ("ip".to_string(), "8.8.8.8".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_adds_credentials() {
        let transport = Arc::new(
            StubTransport::new().respond("https://api.ipplus360.com/ip/info/v1/scene/", "{}"),
        );
        let d = dispatcher(transport.clone());
        let request = LookupRequest::new(
            Operation::Scene,
            "1.2.3.4",
            AddressFamily::IPv4,
            "ip/info/v1/scene/",
            &[("lang", "cn")],
        );

        let body = d.dispatch(&request).await.unwrap();
        assert_eq!(body, "{}");

        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://api.ipplus360.com/ip/info/v1/scene/");
        assert_eq!(seen[0].param("ip"), Some("1.2.3.4"));
        assert_eq!(seen[0].param("lang"), Some("cn"));
        assert_eq!(seen[0].param("key"), Some("test-key"));
        assert_eq!(seen[0].param("channel"), Some(CHANNEL));
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_transport_error() {
        let transport = Arc::new(StubTransport::new());
        let d = dispatcher(transport);
        let request = LookupRequest::new(
            Operation::Host,
            "1.2.3.4",
            AddressFamily::IPv4,
            "ip/geo/v1/host/",
            &[],
        );
        let err = d.dispatch(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_sends_no_credentials() {
        let url = "https://www.ipuu.net/ipuu/user/getIP";
        let transport = Arc::new(StubTransport::new().respond(url, r#"{"data":"1.1.1.1"}"#));
        let d = dispatcher(transport.clone());
        d.fetch(url).await.unwrap();
        let seen = transport.requests();
        assert!(seen[0].query.is_empty());
    }

    mod reqwest_transport {
        use super::*;
        use crate::error::LookupError;
        use axum::http::StatusCode;
        use axum::routing::get;
        use axum::Router;
        use tokio::net::TcpListener;

        const FAILURE_BODY: &str = r#"{"code":"ServerError","msg":"boom"}"#;

        async fn spawn_provider() -> String {
            let app = Router::new()
                .route(
                    "/broken",
                    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY) }),
                )
                .route(
                    "/slow",
                    get(|| async {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        "{}"
                    }),
                );
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }

        #[tokio::test]
        async fn test_non_success_status_returns_body() {
            let base = spawn_provider().await;
            let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
            let body = transport
                .get(&format!("{}/broken", base), &[])
                .await
                .unwrap();
            assert_eq!(body, FAILURE_BODY);
        }

        #[tokio::test]
        async fn test_slow_provider_times_out() {
            let base = spawn_provider().await;
            let transport = ReqwestTransport::new(Duration::from_millis(300)).unwrap();
            let err = transport
                .get(&format!("{}/slow", base), &[])
                .await
                .unwrap_err();
            assert!(matches!(err, TransportError::Timeout), "got {:?}", err);
        }

        #[tokio::test]
        async fn test_connection_failure_hides_api_key() {
            // Bind and drop to get a port nothing listens on.
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let mut config = Config::new("SUPER-SECRET-KEY");
            config.upstream.base_url = format!("http://{}", addr);
            let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
            let d = RequestDispatcher::new(Arc::new(config), Arc::new(transport));
            let request = LookupRequest::new(
                Operation::Host,
                "1.2.3.4",
                AddressFamily::IPv4,
                "ip/geo/v1/host/",
                &[],
            );

            let err = LookupError::from(d.dispatch(&request).await.unwrap_err());
            assert!(matches!(err, LookupError::Transport(TransportError::Http(_))));
            let rendered = format!("{} {:?}", err, err);
            assert!(!rendered.contains("SUPER-SECRET-KEY"), "{}", rendered);
            assert!(!rendered.contains("key="), "{}", rendered);
        }
    }
}
