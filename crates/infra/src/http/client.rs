use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use paczkomat_common::error::{classify, ClientError, ClientResult, ResponseBody};
use paczkomat_domain::constants::BROWSER_USER_AGENT;
use parking_lot::{Mutex, RwLock};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Request body variants accepted by [`HttpClient::post`].
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/json` body.
    Json(Value),
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
}

/// Normalized HTTP response.
///
/// Produced once per request and handed to the caller; nothing is cached.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// JSON when the body decodes, raw text otherwise.
    pub body: ResponseBody,
    /// HTTP status code.
    pub status: u16,
    /// Cookies set by this response (`Set-Cookie`), by name.
    pub cookies: HashMap<String, String>,
    /// Response headers (`Location` for redirects).
    pub headers: HeaderMap,
}

impl HttpResponse {
    /// Status 400 or above.
    pub const fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Header value as text, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Fail with the classified API error if the response carries one.
    ///
    /// # Errors
    /// `ClientError::Api` with the classified error.
    pub fn raise_for_error(&self) -> ClientResult<()> {
        match classify(&self.body, self.status) {
            Some(error) => Err(ClientError::Api(error)),
            None => Ok(()),
        }
    }

    /// Deserialize a JSON body.
    ///
    /// # Errors
    /// `Protocol` if the body is not JSON or does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        let value = self.body.as_json().ok_or_else(|| {
            ClientError::Protocol(format!("expected a JSON body (status {})", self.status))
        })?;
        T::deserialize(value)
            .map_err(|err| ClientError::Protocol(format!("unexpected response shape: {err}")))
    }
}

struct Session {
    client: ReqwestClient,
    jar: Arc<Jar>,
}

/// Async HTTP transport with a private, lazily created session.
///
/// Headers are layered in increasing precedence: built-in defaults
/// (User-Agent), instance headers (bearer token, XSRF token, ...) and
/// per-call headers. Redirects are never followed.
pub struct HttpClient {
    session: Mutex<Option<Session>>,
    headers: RwLock<HeaderMap>,
    default_headers: HeaderMap,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Per-request time budget.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a live session exists.
    pub fn is_open(&self) -> bool {
        self.session.lock().is_some()
    }

    // Reuses the live session or creates a fresh one.
    fn session(&self) -> ClientResult<(ReqwestClient, Arc<Jar>)> {
        let mut guard = self.session.lock();
        if let Some(session) = guard.as_ref() {
            return Ok((session.client.clone(), Arc::clone(&session.jar)));
        }

        let jar = Arc::new(Jar::default());
        let client = ReqwestClient::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        debug!("created HTTP session");

        *guard = Some(Session { client: client.clone(), jar: Arc::clone(&jar) });
        Ok((client, jar))
    }

    /// Set or replace an instance-level header.
    ///
    /// # Errors
    /// `Config` for an invalid header name or value.
    pub fn set_header(&self, name: &str, value: &str) -> ClientResult<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.write().insert(name, value);
        Ok(())
    }

    /// Install `Authorization: Bearer <token>` on every later request.
    ///
    /// # Errors
    /// `Config` if the token is not a valid header value.
    pub fn set_bearer_token(&self, token: &str) -> ClientResult<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::Config("access token is not a valid header value".into()))?;
        value.set_sensitive(true);
        self.headers.write().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Instance-level header value, if set.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.read().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    }

    /// Add a cookie to the live session for `url`.
    ///
    /// # Errors
    /// `Config` for an invalid URL, `Transport` if the session cannot be
    /// created.
    pub fn set_cookie(&self, name: &str, value: &str, url: &str) -> ClientResult<()> {
        let url = parse_url(url)?;
        let (_, jar) = self.session()?;
        jar.add_cookie_str(&format!("{name}={value}; Path=/"), &url);
        Ok(())
    }

    /// Cookie the session would send to `url`.
    pub fn cookie(&self, name: &str, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let guard = self.session.lock();
        let header = guard.as_ref()?.jar.cookies(&url)?;
        let header = header.to_str().ok()?;

        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// GET `url` with query `params` and per-call `headers`.
    ///
    /// # Errors
    /// `RequestTimeout`, `Transport`, or `Config` for an invalid URL or
    /// header. HTTP error statuses are returned as responses.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> ClientResult<HttpResponse> {
        let (client, _) = self.session()?;
        let builder = client.request(Method::GET, parse_url(url)?).query(params);
        self.execute(builder, headers).await
    }

    /// POST `body` to `url` with per-call `headers`.
    ///
    /// # Errors
    /// Same as [`HttpClient::get`].
    pub async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &[(&str, &str)],
    ) -> ClientResult<HttpResponse> {
        let (client, _) = self.session()?;
        let builder = client.request(Method::POST, parse_url(url)?);
        let builder = match body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
        };
        self.execute(builder, headers).await
    }

    /// POST a JSON body.
    ///
    /// # Errors
    /// Same as [`HttpClient::get`].
    pub async fn post_json(&self, url: &str, body: Value) -> ClientResult<HttpResponse> {
        self.post(url, RequestBody::Json(body), &[]).await
    }

    /// POST form-encoded fields.
    ///
    /// # Errors
    /// Same as [`HttpClient::get`].
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> ClientResult<HttpResponse> {
        let fields = fields.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        self.post(url, RequestBody::Form(fields), &[]).await
    }

    /// Drop the session. Safe to call repeatedly or before first use; the
    /// next request opens a new session.
    pub fn close(&self) {
        if self.session.lock().take().is_some() {
            debug!("closed HTTP session");
        }
    }

    fn merged_headers(&self, call_headers: &[(&str, &str)]) -> ClientResult<HeaderMap> {
        let mut merged = self.default_headers.clone();
        for (name, value) in self.headers.read().iter() {
            merged.insert(name.clone(), value.clone());
        }
        for (name, value) in call_headers {
            let (name, value) = parse_header(name, value)?;
            merged.insert(name, value);
        }
        Ok(merged)
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        call_headers: &[(&str, &str)],
    ) -> ClientResult<HttpResponse> {
        let request = builder.headers(self.merged_headers(call_headers)?).build()?;
        let (client, _) = self.session()?;

        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "sending HTTP request");

        let exchange = async {
            let response = client.execute(request).await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let cookies = response
                .cookies()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect::<HashMap<_, _>>();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>(HttpResponse {
                body: ResponseBody::from_bytes(&bytes),
                status,
                cookies,
                headers,
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(%method, %path, status = response.status, "received HTTP response");
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(%method, %path, error = %err, "HTTP request failed");
                Err(ClientError::Transport(err))
            }
            Err(_) => {
                warn!(%method, %path, timeout = ?self.timeout, "HTTP request timed out");
                Err(ClientError::RequestTimeout(self.timeout))
            }
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_url(url: &str) -> ClientResult<Url> {
    Url::parse(url).map_err(|err| ClientError::Config(format!("invalid URL {url}: {err}")))
}

fn parse_header(name: &str, value: &str) -> ClientResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::Config(format!("invalid header name: {name}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| ClientError::Config(format!("invalid value for header {name}")))?;
    Ok((name, value))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: BROWSER_USER_AGENT.to_string(),
            default_headers: HeaderMap::new(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request time budget (default 30s).
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Built-in `User-Agent` (default: mobile browser).
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Add a built-in header. Invalid names or values are skipped with a
    /// warning.
    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.default_headers.insert(name, value);
            }
            Err(err) => warn!(error = %err, "ignoring default header"),
        }
        self
    }

    /// Build the client. No connection is opened until the first request.
    pub fn build(self) -> HttpClient {
        let mut default_headers = self.default_headers;
        match HeaderValue::from_str(&self.user_agent) {
            Ok(agent) => {
                default_headers.insert(USER_AGENT, agent);
            }
            Err(_) => warn!("ignoring invalid user agent"),
        }

        HttpClient {
            session: Mutex::new(None),
            headers: RwLock::new(HeaderMap::new()),
            default_headers,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> HttpClient {
        HttpClient::builder().timeout(Duration::from_secs(5)).build()
    }

    #[tokio::test]
    async fn parses_json_and_falls_back_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"step": "ONBOARDED"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/text"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let client = client();
        let json = client.get(&format!("{}/json", server.uri()), &[], &[]).await.expect("json");
        let text = client.get(&format!("{}/text", server.uri()), &[], &[]).await.expect("text");

        assert_eq!(json.body, ResponseBody::Json(json!({"step": "ONBOARDED"})));
        assert_eq!(text.body, ResponseBody::Text("<html>bad gateway</html>".into()));
        assert!(text.is_error());
    }

    #[tokio::test]
    async fn header_layers_increase_in_precedence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-layer", "call"))
            .and(header("x-instance", "yes"))
            .and(header("accept-language", "pl-PL"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = HttpClient::builder()
            .default_header("Accept-Language", "pl-PL")
            .default_header("X-Layer", "default")
            .build();
        client.set_header("X-Layer", "instance").expect("header");
        client.set_header("X-Instance", "yes").expect("header");

        let response = client
            .get(&server.uri(), &[], &[("X-Layer", "call")])
            .await
            .expect("response");

        assert_eq!(response.status, 204);
        let requests = server.received_requests().await.unwrap_or_default();
        let agent = requests[0].headers.get("user-agent").and_then(|v| v.to_str().ok());
        assert_eq!(agent, Some(BROWSER_USER_AGENT));
    }

    #[tokio::test]
    async fn redirects_are_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authorize"))
            .and(query_param("response_type", "code"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "https://cb?code=abc&state=s"),
            )
            .mount(&server)
            .await;

        let response = client()
            .get(
                &format!("{}/authorize", server.uri()),
                &[("response_type", "code".to_string())],
                &[],
            )
            .await
            .expect("response");

        assert_eq!(response.status, 302);
        assert_eq!(response.header("location"), Some("https://cb?code=abc&state=s"));
        assert!(response.raise_for_error().is_ok());
    }

    #[tokio::test]
    async fn cookies_are_captured_and_replayed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/set"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Set-Cookie", "XSRF-TOKEN=tok123; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client();
        let set = client.get(&format!("{}/set", server.uri()), &[], &[]).await.expect("set");
        client.set_cookie("NEXT_LOCALE", "pl-PL", &server.uri()).expect("cookie");
        let echo = client.get(&format!("{}/echo", server.uri()), &[], &[]).await.expect("echo");

        assert_eq!(set.cookies.get("XSRF-TOKEN").map(String::as_str), Some("tok123"));
        assert_eq!(client.cookie("XSRF-TOKEN", &server.uri()).as_deref(), Some("tok123"));
        assert_eq!(echo.status, 200);

        let requests = server.received_requests().await.unwrap_or_default();
        let sent = requests
            .last()
            .and_then(|r| r.headers.get("cookie"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(sent.contains("XSRF-TOKEN=tok123"), "cookies: {sent}");
        assert!(sent.contains("NEXT_LOCALE=pl-PL"), "cookies: {sent}");
    }

    #[tokio::test]
    async fn timeout_maps_to_request_timeout_and_session_survives() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = HttpClient::builder().timeout(Duration::from_millis(50)).build();
        let err = client
            .get(&format!("{}/slow", server.uri()), &[], &[])
            .await
            .expect_err("must time out");

        assert!(matches!(err, ClientError::RequestTimeout(d) if d == Duration::from_millis(50)));
        assert!(client.is_open());
        let ok = client.get(&format!("{}/fast", server.uri()), &[], &[]).await.expect("fast");
        assert_eq!(ok.status, 200);
    }

    #[tokio::test]
    async fn connection_failure_propagates_transport_error() {
        let err = client()
            .get("http://127.0.0.1:9/unreachable", &[], &[])
            .await
            .expect_err("must fail");
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn form_and_json_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/form"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/json"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client();
        let form = client
            .post_form(&format!("{}/form", server.uri()), &[("grant_type", "refresh_token")])
            .await
            .expect("form");
        let json = client
            .post_json(&format!("{}/json", server.uri()), json!({"code": "123456"}))
            .await
            .expect("json");

        assert_eq!(form.status, 200);
        assert_eq!(json.status, 200);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_session_reopens() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let client = client();
        client.close();
        assert!(!client.is_open());

        client.get(&server.uri(), &[], &[]).await.expect("first");
        client.close();
        client.close();
        client.get(&server.uri(), &[], &[]).await.expect("after close");

        assert!(client.is_open());
        assert_eq!(server.received_requests().await.map(|r| r.len()), Some(2));
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client();
        client.set_bearer_token("abc").expect("token");

        assert_eq!(client.get(&server.uri(), &[], &[]).await.expect("get").status, 200);
        assert_eq!(client.header("authorization").as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let err = client().set_header("bad header", "x").expect_err("must fail");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn raise_for_error_classifies() {
        let response = HttpResponse {
            body: ResponseBody::Text(String::new()),
            status: 403,
            cookies: HashMap::new(),
            headers: HeaderMap::new(),
        };
        let err = response.raise_for_error().expect_err("403");
        assert_eq!(err.api_kind(), Some(paczkomat_common::ApiErrorKind::Forbidden));
    }
}
