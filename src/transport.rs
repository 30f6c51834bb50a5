//! Wire dispatch behind a swappable trait, so the whole stack above it can
//! run against an in-memory backend in tests.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// HTTP methods the resource verbs map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully resolved request: the URL is already built, the body (if any)
/// is serialized exactly once at dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: unreachable host, timeout, interrupted body.
    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("server returned {status} for {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The response arrived but its body did not match the expected shape.
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A resource path was used in a way its declaration does not allow.
    #[error(transparent)]
    Endpoint(#[from] crate::endpoint::EndpointError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Unknown id: the resource the request addressed does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Input the client passed through unchecked and the server rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400 | 409 | 422))
    }

    /// Server-side failure, including inference that produced no result.
    pub fn is_server(&self) -> bool {
        self.status().map_or(false, |s| s >= 500)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request, returning the decoded JSON body (`Null` when the
    /// response carries none). Never swallows a failure.
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError>;
}

/// Production transport over a shared reqwest connection pool.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    retries: u32,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64, retries: u32) -> Self {
        Self {
            client: reqwest::Client::builder()
                .pool_max_idle_per_host(8)
                .tcp_nodelay(true)
                .build()
                .expect("reqwest client"),
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let mut attempt = 0u32;
        loop {
            let mut r = match req.method {
                Method::Get => self.client.get(&req.url),
                Method::Post => self.client.post(&req.url),
                Method::Put => self.client.put(&req.url),
                Method::Patch => self.client.patch(&req.url),
                Method::Delete => self.client.delete(&req.url),
            };
            r = r.timeout(self.timeout);
            if !req.query.is_empty() {
                r = r.query(&req.query);
            }
            if let Some(body) = &req.body {
                r = r.json(body);
            }

            log::debug!("[transport] {} {}", req.method, req.url);

            let res = r.send().await.map_err(|e| ApiError::Transport {
                url: req.url.clone(),
                reason: e.to_string(),
            })?;

            let status = res.status();
            if status.is_success() {
                let text = res.text().await.map_err(|e| ApiError::Transport {
                    url: req.url.clone(),
                    reason: e.to_string(),
                })?;
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| ApiError::Decode {
                    url: req.url.clone(),
                    reason: e.to_string(),
                });
            }

            // Bounded retry on transient statuses, reads only: re-issuing a
            // create could duplicate the record.
            if req.method == Method::Get
                && matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
                && attempt < self.retries
            {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(150 * attempt as u64)).await;
                continue;
            }

            let message = res
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            log::warn!("[transport] {} {} failed: {}", req.method, req.url, status);
            return Err(ApiError::Status {
                url: req.url.clone(),
                status: status.as_u16(),
                message,
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Route-matching transport for unit tests: responses are keyed by
    //! method plus URL suffix, so concurrent fetches stay deterministic.

    use super::*;
    use std::sync::Mutex;

    pub(crate) enum Canned {
        Ok(Value),
        Status(u16, &'static str),
    }

    pub(crate) struct RouteTransport {
        routes: Vec<(Method, String, Canned)>,
        pub(crate) seen: Mutex<Vec<ApiRequest>>,
    }

    impl RouteTransport {
        pub(crate) fn new(routes: Vec<(Method, &str, Canned)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(m, s, c)| (m, s.to_string(), c))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RouteTransport {
        async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
            self.seen.lock().unwrap().push(req.clone());
            for (method, suffix, canned) in &self.routes {
                if *method == req.method && req.url.ends_with(suffix.as_str()) {
                    return match canned {
                        Canned::Ok(v) => Ok(v.clone()),
                        Canned::Status(status, message) => Err(ApiError::Status {
                            url: req.url.clone(),
                            status: *status,
                            message: (*message).to_string(),
                        }),
                    };
                }
            }
            panic!("unexpected request: {} {}", req.method, req.url);
        }
    }
}
