//! HTTP client wrapper.
//!
//! Every request carries `X-Tenant-ID` from the caller's [`RequestContext`]
//! and `Authorization: Bearer` from the session store, each only when present.
//! A 401 clears the stored tokens and sends the navigator to the login route.
//! Everything else that fails comes back as a normalized [`ApiError`].

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{Navigator, SessionStore};
use crate::types::unwrap_envelope;

pub mod retry;

pub use retry::RetryPolicy;

pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Per-call context. Built from the tenant store and handed to every
/// request-issuing function instead of being read from shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
        }
    }
}

pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    retry: RetryPolicy,
    login_route: String,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|e| ApiError::validation(format!("Invalid API base URL '{}': {}", config.api.base_url, e), None))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::validation(format!("API base URL '{}' cannot carry a path", base_url), None));
        }

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url,
            session,
            navigator,
            retry: RetryPolicy::from_config(config),
            login_route: config.session.login_route.clone(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Only the leading collection path
    /// may span several segments; every later segment (ids, actions) is
    /// encoded whole, so a `/` inside an id becomes `%2F`.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        let Some((collection, rest)) = segments.split_first() else {
            return Ok(url);
        };

        if let Some(bad) = rest.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::validation(format!("'{}' is not a usable record id", bad), None));
        }

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(collection.split('/').filter(|s| !s.is_empty()));
            path.extend(rest);
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let value = self.send(ctx, Method::GET, segments, query, None).await?;
        decode(value)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let body = body.map(serde_json::to_value).transpose()?;
        let value = self.send(ctx, Method::POST, segments, &[], body).await?;
        decode(value)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let value = self.send(ctx, Method::PUT, segments, &[], Some(body)).await?;
        decode(value)
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let value = self.send(ctx, Method::PATCH, segments, &[], Some(body)).await?;
        decode(value)
    }

    /// Whatever the server sends back on delete is discarded
    pub async fn delete(&self, ctx: &RequestContext, segments: &[&str]) -> Result<(), ApiError> {
        self.send(ctx, Method::DELETE, segments, &[], None).await?;
        Ok(())
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        let mut attempt = 0;

        loop {
            match self.execute(ctx, method.clone(), url.clone(), query, body.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) if self.retry.should_retry(&method, attempt, &err) => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        method, url, err, attempt + 1, self.retry.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(ApiError::Unauthorized(message)) => {
                    self.handle_unauthorized().await;
                    return Err(ApiError::Unauthorized(message));
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!("{} {} tenant={:?}", method, url, ctx.tenant_id);

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(self.headers(ctx).await?);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::network(e.to_string()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ApiError::network(e.to_string()))?;

        tracing::debug!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &bytes));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(unwrap_envelope(serde_json::from_slice(&bytes)?))
    }

    async fn headers(&self, ctx: &RequestContext) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(ref tenant_id) = ctx.tenant_id {
            let value = HeaderValue::from_str(tenant_id)
                .map_err(|_| ApiError::validation(format!("Tenant id '{}' is not a valid header value", tenant_id), None))?;
            headers.insert(TENANT_HEADER, value);
        }

        let tokens = match self.session.load_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                // Unreadable session behaves like a logged-out one
                tracing::warn!("Could not read stored tokens: {}", e);
                Default::default()
            }
        };
        if let Some(token) = tokens.access_token.filter(|t| auth::is_usable(t)) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    async fn handle_unauthorized(&self) {
        tracing::warn!("Request rejected with 401, clearing session");
        if let Err(e) = self.session.clear_tokens().await {
            tracing::error!("Failed to clear stored tokens: {}", e);
        }
        self.navigator.navigate(&self.login_route);
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}
