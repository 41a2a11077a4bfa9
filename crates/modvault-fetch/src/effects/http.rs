use std::fmt;
use std::io::Read;

use crate::error::Result;

/// One GET request.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub url:     &'a str,
    /// Query pairs appended to `url`; keys may repeat.
    pub query:   &'a [(String, String)],
    pub headers: &'a [(String, String)],
}

impl<'a> HttpRequest<'a> {
    pub fn get(url: &'a str) -> Self {
        Self {
            url,
            query: &[],
            headers: &[],
        }
    }

    pub fn query(mut self, query: &'a [(String, String)]) -> Self {
        self.query = query;
        self
    }

    pub fn headers(mut self, headers: &'a [(String, String)]) -> Self {
        self.headers = headers;
        self
    }
}

/// Status, announced length and a streaming body.
pub struct HttpResponse {
    pub status:         u16,
    pub content_length: Option<u64>,
    pub body:           Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn is_rate_limited(&self) -> bool { self.status == 429 }

    pub fn into_string(mut self) -> std::io::Result<String> {
        let mut text = String::new();
        self.body.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP client abstraction.
///
/// Implementations return every received status as an `Ok` response; only
/// transport failures (DNS, refused connection, TLS) are errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest::blocking`
/// - [`crate::MockHttpClient`]: scripted responses for tests
pub trait HttpClient {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse> { (**self).get(request) }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use super::*;
    use crate::data::DEFAULT_IDLE_TIMEOUT;
    use crate::error::FetchError;

    /// Production HTTP client implementation using `reqwest::blocking`.
    ///
    /// Cloning is cheap; clones share one connection pool.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: reqwest::blocking::Client,
    }

    impl ReqwestClient {
        pub fn new(user_agent: &str) -> Result<Self> {
            Self::with_idle_timeout(user_agent, DEFAULT_IDLE_TIMEOUT)
        }

        /// `idle` bounds the wait for headers and for each body read, not the
        /// whole transfer, so a connection that stops sending fails the
        /// attempt while a slow but live one is left to the stall check.
        pub fn with_idle_timeout(user_agent: &str, idle: Duration) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(user_agent)
                .connect_timeout(Duration::from_secs(30))
                .timeout(idle)
                .build()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse> {
            let mut builder = self.client.get(request.url);
            if !request.query.is_empty() {
                builder = builder.query(request.query);
            }
            for (key, value) in request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }

            let response = builder
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;

            Ok(HttpResponse {
                status:         response.status().as_u16(),
                content_length: response.content_length(),
                body:           Box::new(response),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
