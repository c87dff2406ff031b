//! A [`staybook::BookingApi`] implementation that talks to the booking service
//! over HTTP.
//!
//! [`BookingApiClient`] handles the pre-book, initialize and finish endpoints,
//! all `POST` with `camelCase` JSON bodies.
//!
//! ## Error Handling
//!
//! [`BookingClientError`] captures the failing request together with
//! - URL construction
//! - HTTP transport failures and timeouts
//! - JSON deserialization errors
//! - Unexpected HTTP status responses, with the response body
//!
//! The client never retries. In particular a failed finish is reported as-is:
//! retrying it could confirm the same payment twice.

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::{Client, Response};
use staybook::api::{ApiError, BookingApi, BoxFuture};
use staybook::proto::{
    BookingIntent, FinishRequest, InitializeRequest, PrebookRequest, PrebookResponse,
};
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::auth::{AuthHeaders, AuthProvider};
use crate::constants::{FINISH_PATH, INITIALIZE_PATH, PREBOOK_PATH};
use crate::error::BookingClientError;

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Prebook,
    Initialize,
    Finish,
}

impl Endpoint {
    const fn context(self) -> &'static str {
        match self {
            Self::Prebook => "POST /prebook",
            Self::Initialize => "POST /booking/initialize",
            Self::Finish => "POST /booking/finish",
        }
    }

    fn auth_headers(self, headers: AuthHeaders) -> HeaderMap {
        match self {
            Self::Prebook => headers.prebook,
            Self::Initialize => headers.initialize,
            Self::Finish => headers.finish,
        }
    }
}

/// HTTP client for the pricing and booking API.
#[derive(Clone)]
pub struct BookingApiClient {
    /// Base URL of the API (e.g. `https://api.example.com/v1/`)
    base_url: Url,
    /// Full URL to `POST /prebook`
    prebook_url: Url,
    /// Full URL to `POST /booking/initialize`
    initialize_url: Url,
    /// Full URL to `POST /booking/finish`
    finish_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Custom headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
    /// Optional per-request authentication
    auth: Option<Arc<dyn AuthProvider>>,
}

impl fmt::Debug for BookingApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("header_count", &self.headers.len())
            .field("has_auth_provider", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl BookingApiClient {
    /// Constructs a new client from a base URL.
    ///
    /// Endpoint URLs are resolved relative to the base, so the base should
    /// end with a slash. The `TryFrom<&str>` impl normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError::UrlParse`] if URL construction fails.
    pub fn try_new(base_url: Url) -> Result<Self, BookingClientError> {
        let join = |path: &str, context: &'static str| {
            base_url
                .join(path)
                .map_err(|source| BookingClientError::UrlParse { context, source })
        };
        let prebook_url = join(PREBOOK_PATH, "Failed to construct ./prebook URL")?;
        let initialize_url = join(
            INITIALIZE_PATH,
            "Failed to construct ./booking/initialize URL",
        )?;
        let finish_url = join(FINISH_PATH, "Failed to construct ./booking/finish URL")?;
        Ok(Self {
            base_url,
            prebook_url,
            initialize_url,
            finish_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            auth: None,
        })
    }

    /// Returns the base URL used by this client.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the pre-book endpoint URL.
    #[must_use]
    pub const fn prebook_url(&self) -> &Url {
        &self.prebook_url
    }

    /// Returns the initialize endpoint URL.
    #[must_use]
    pub const fn initialize_url(&self) -> &Url {
        &self.initialize_url
    }

    /// Returns the finish endpoint URL.
    #[must_use]
    pub const fn finish_url(&self) -> &Url {
        &self.finish_url
    }

    /// Returns any custom headers configured on the client.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the authentication provider.
    #[must_use]
    pub fn with_auth(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(provider));
        self
    }

    /// Uses a pre-configured reqwest client (proxy, TLS, connection pool).
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sends a `POST /prebook` request.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError`] if the request fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "staybook.api.prebook",
            skip_all,
            fields(hash = %request.hash, otel.status_code = tracing::field::Empty),
            err
        )
    )]
    pub async fn prebook(
        &self,
        request: &PrebookRequest,
    ) -> Result<PrebookResponse, BookingClientError> {
        self.post_json(&self.prebook_url, Endpoint::Prebook, request)
            .await
    }

    /// Sends a `POST /booking/initialize` request.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError`] if the request fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "staybook.api.initialize",
            skip_all,
            fields(property_id = %request.property_id, otel.status_code = tracing::field::Empty),
            err
        )
    )]
    pub async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<BookingIntent, BookingClientError> {
        self.post_json(&self.initialize_url, Endpoint::Initialize, request)
            .await
    }

    /// Sends a `POST /booking/finish` request.
    ///
    /// Any 2xx status is success; the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError`] if the request fails. A timeout does not
    /// mean the booking was not confirmed.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "staybook.api.finish",
            skip_all,
            fields(order_id = %request.order_id, otel.status_code = tracing::field::Empty),
            err
        )
    )]
    pub async fn finish(&self, request: &FinishRequest) -> Result<(), BookingClientError> {
        let result = self
            .send(&self.finish_url, Endpoint::Finish, request)
            .await
            .map(drop);
        record_result_on_span(&result);
        result
    }

    /// Generic POST helper that decodes a JSON response body.
    async fn post_json<T, R>(
        &self,
        url: &Url,
        endpoint: Endpoint,
        payload: &T,
    ) -> Result<R, BookingClientError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let result = match self.send(url, endpoint, payload).await {
            Ok(response) => response.json::<R>().await.map_err(|source| {
                BookingClientError::JsonDeserialization {
                    context: endpoint.context(),
                    source,
                }
            }),
            Err(err) => Err(err),
        };

        record_result_on_span(&result);

        result
    }

    /// Sends the request and maps non-2xx statuses to
    /// [`BookingClientError::HttpStatus`].
    async fn send<T>(
        &self,
        url: &Url,
        endpoint: Endpoint,
        payload: &T,
    ) -> Result<Response, BookingClientError>
    where
        T: serde::Serialize + Sync + ?Sized,
    {
        let context = endpoint.context();
        let mut req = self.client.post(url.clone()).json(payload);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(auth) = &self.auth {
            for (key, value) in &endpoint.auth_headers(auth.get_auth_headers()) {
                req = req.header(key, value);
            }
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|source| BookingClientError::Http { context, source })?;

        let status = http_response.status();
        if status.is_success() {
            return Ok(http_response);
        }
        let body = http_response
            .text()
            .await
            .map_err(|source| BookingClientError::ResponseBodyRead { context, source })?;
        Err(BookingClientError::HttpStatus {
            context,
            status,
            body,
        })
    }
}

impl BookingApi for BookingApiClient {
    fn prebook<'a>(
        &'a self,
        request: &'a PrebookRequest,
    ) -> BoxFuture<'a, Result<PrebookResponse, ApiError>> {
        Box::pin(async move { Self::prebook(self, request).await.map_err(ApiError::from) })
    }

    fn initialize<'a>(
        &'a self,
        request: &'a InitializeRequest,
    ) -> BoxFuture<'a, Result<BookingIntent, ApiError>> {
        Box::pin(async move {
            Self::initialize(self, request)
                .await
                .map_err(ApiError::from)
        })
    }

    fn finish<'a>(&'a self, request: &'a FinishRequest) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move { Self::finish(self, request).await.map_err(ApiError::from) })
    }
}

/// Parses a base URL, normalizing it to end with exactly one slash.
impl TryFrom<&str> for BookingApiClient {
    type Error = BookingClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|source| BookingClientError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        Self::try_new(url)
    }
}

impl TryFrom<String> for BookingApiClient {
    type Error = BookingClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to booking API failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuthProvider;
    use http::{HeaderValue, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::json;
    use staybook::proto::{
        BookHash, GuestSelection, OrderId, PaymentProof, PaymentType,
    };
    use staybook::{BookingError, BookingOrchestrator, PaymentContext, PaymentExecutionError};
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> BookingApiClient {
        BookingApiClient::try_from(server.uri()).unwrap()
    }

    fn finish_request() -> FinishRequest {
        FinishRequest {
            order_id: OrderId::new("ord1"),
            upsell_data: vec![],
            payment: PaymentProof::on_chain("sig1", Decimal::from(100)),
            payment_type: PaymentType::new("deposit"),
            guests: GuestSelection::new(2),
        }
    }

    #[test]
    fn test_endpoint_urls_resolve_under_base_path() {
        let client = BookingApiClient::try_from("https://api.example.com/v1//").unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
        assert_eq!(
            client.prebook_url().as_str(),
            "https://api.example.com/v1/prebook"
        );
        assert_eq!(
            client.initialize_url().as_str(),
            "https://api.example.com/v1/booking/initialize"
        );
        assert_eq!(
            client.finish_url().as_str(),
            "https://api.example.com/v1/booking/finish"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = BookingApiClient::try_from("not a url").unwrap_err();
        assert!(matches!(err, BookingClientError::UrlParse { .. }));
    }

    #[tokio::test]
    async fn test_prebook_sends_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prebook"))
            .and(body_json(json!({ "hash": "abc", "priceIncreasePercent": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "changes": { "priceChanged": true },
                "rates": [{
                    "bookHash": "def",
                    "paymentOptions": { "paymentTypes": [{ "type": "deposit" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .await
            .prebook(&PrebookRequest {
                hash: BookHash::new("abc"),
                price_increase_percent: Some(3),
            })
            .await
            .unwrap();

        assert_eq!(
            response.effective_hash(&BookHash::new("abc")),
            Some(BookHash::new("def"))
        );
    }

    #[tokio::test]
    async fn test_initialize_accepts_numeric_order_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/initialize"))
            .and(body_json(json!({ "propertyId": "prop-1", "hash": "abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": 12345,
                "paymentTypes": [{ "type": "deposit", "amount": 42.5, "currencyCode": "USD" }]
            })))
            .mount(&server)
            .await;

        let intent = client_for(&server)
            .await
            .initialize(&InitializeRequest {
                property_id: "prop-1".to_owned(),
                hash: BookHash::new("abc"),
            })
            .await
            .unwrap();

        assert_eq!(intent.order_id, OrderId::from(12_345_u64));
        assert_eq!(
            intent
                .payment_type("deposit")
                .and_then(|p| p.amount.as_ref())
                .map(|a| a.value()),
            Some(Decimal::new(425, 1))
        );
    }

    #[tokio::test]
    async fn test_finish_accepts_empty_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .and(body_partial_json(json!({
                "orderId": "ord1",
                "upsellData": [],
                "payment": { "method": "on_chain", "signature": "sig1" },
                "paymentType": { "type": "deposit" }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .await
            .finish(&finish_request())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .finish(&finish_request())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        match err {
            BookingClientError::HttpStatus { context, body, .. } => {
                assert_eq!(context, "POST /booking/finish");
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_deserialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prebook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .prebook(&PrebookRequest {
                hash: BookHash::new("abc"),
                price_increase_percent: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingClientError::JsonDeserialization {
                context: "POST /prebook",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .with_timeout(Duration::from_millis(50))
            .finish(&finish_request())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_headers_and_auth_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-client", "staybook-tests"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-client", HeaderValue::from_static("staybook-tests"));
        client_for(&server)
            .await
            .with_headers(headers)
            .with_auth(StaticAuthProvider::bearer("secret").unwrap())
            .finish(&finish_request())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_orchestrator_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prebook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "changes": { "priceChanged": false },
                "rates": []
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/booking/initialize"))
            .and(body_json(json!({ "propertyId": "prop-1", "hash": "abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": "ord1",
                "paymentTypes": [{
                    "type": "deposit",
                    "amount": 100.5,
                    "currencyCode": "USD",
                    "isNeedCreditCardData": false
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .and(body_json(json!({
                "orderId": "ord1",
                "upsellData": [],
                "payment": { "method": "on_chain", "signature": "sig1", "amount": "100.5" },
                "paymentType": {
                    "type": "deposit",
                    "amount": 100.5,
                    "currencyCode": "USD",
                    "isNeedCreditCardData": false
                },
                "guests": { "adults": 2, "children": [] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let orchestrator = BookingOrchestrator::new(client_for(&server).await);
        let executor = |ctx: &PaymentContext| {
            let amount = ctx.payment_type.amount.as_ref().map(|a| a.value());
            async move {
                let amount = amount.ok_or_else(|| {
                    PaymentExecutionError::InvalidAmount("no quoted amount".into())
                })?;
                Ok::<_, PaymentExecutionError>(PaymentProof::on_chain("sig1", amount))
            }
        };

        let order_id = orchestrator
            .process_booking(
                BookHash::new("abc"),
                GuestSelection::new(2),
                "prop-1",
                &executor,
            )
            .await
            .unwrap();

        assert_eq!(order_id, OrderId::new("ord1"));
    }

    #[tokio::test]
    async fn test_orchestrator_surfaces_finish_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prebook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/booking/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": "ord1",
                "paymentTypes": [{ "type": "deposit" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/booking/finish"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db locked"))
            .expect(1)
            .mount(&server)
            .await;

        let executor = |_: &PaymentContext| async {
            Ok::<_, PaymentExecutionError>(PaymentProof::on_chain("sig1", Decimal::from(100)))
        };
        let err = BookingOrchestrator::new(client_for(&server).await)
            .process_booking(
                BookHash::new("abc"),
                GuestSelection::new(1),
                "prop-1",
                &executor,
            )
            .await
            .unwrap_err();

        match err {
            BookingError::BookingFinalizationFailed { proof, source, .. } => {
                assert_eq!(proof.signature(), Some("sig1"));
                let client_err = source.downcast_ref::<BookingClientError>().unwrap();
                assert_eq!(client_err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
