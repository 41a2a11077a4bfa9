use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::effects::http::{HttpClient, HttpRequest, HttpResponse};
use crate::error::{FetchError, Result};

/// A scripted reply for [`MockHttpClient`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Body {
        status:         u16,
        content_length: Option<u64>,
        body:           Vec<u8>,
        read_delay:     Duration,
    },
    /// Transport failure before any status is received.
    Fail(String),
    /// 200 that sends `body` and then stops answering reads.
    Stalled {
        content_length: Option<u64>,
        body:           Vec<u8>,
    },
}

impl MockResponse {
    /// 200 with an accurate `content-length`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        MockResponse::Body {
            status:         200,
            content_length: Some(body.len() as u64),
            body,
            read_delay:     Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        MockResponse::Body {
            status,
            content_length: Some(0),
            body: Vec::new(),
            read_delay: Duration::ZERO,
        }
    }

    /// 200 announcing `declared` bytes but delivering only `body`.
    pub fn truncated(body: impl Into<Vec<u8>>, declared: u64) -> Self {
        MockResponse::Body {
            status:         200,
            content_length: Some(declared),
            body:           body.into(),
            read_delay:     Duration::ZERO,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self { MockResponse::Fail(message.into()) }

    /// 200 announcing `declared` bytes whose connection goes quiet after `body`.
    pub fn stalled(body: impl Into<Vec<u8>>, declared: u64) -> Self {
        MockResponse::Stalled {
            content_length: Some(declared),
            body:           body.into(),
        }
    }

    /// Override the announced length.
    pub fn with_length(self, length: Option<u64>) -> Self {
        match self {
            MockResponse::Body {
                status,
                body,
                read_delay,
                ..
            } => MockResponse::Body {
                status,
                content_length: length,
                body,
                read_delay,
            },
            other => other,
        }
    }

    /// Sleep before every read of the body.
    pub fn slow(self, per_read: Duration) -> Self {
        match self {
            MockResponse::Body {
                status,
                content_length,
                body,
                ..
            } => MockResponse::Body {
                status,
                content_length,
                body,
                read_delay: per_read,
            },
            other => other,
        }
    }
}

/// What the mock saw, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url:     String,
    pub query:   Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Default)]
struct MockState {
    routes:   HashMap<String, VecDeque<MockResponse>>,
    requests: Vec<RecordedRequest>,
}

/// In-memory [`HttpClient`] serving scripted responses per URL.
///
/// Responses for a URL are served in the order they were added; the last one
/// keeps being served once the others are used up. Unknown URLs get a 404.
/// Clones share state, so one clone can be handed to the code under test and
/// another kept for assertions.
#[derive(Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    pub fn new() -> Self { Self::default() }

    pub fn respond(&self, url: impl Into<String>, response: MockResponse) -> &Self {
        self.lock()
            .routes
            .entry(url.into())
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> { self.lock().requests.clone() }

    pub fn request_count(&self, url: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.url == url).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            url:     request.url.to_string(),
            query:   request.query.to_vec(),
            headers: request.headers.to_vec(),
        });

        let reply = match state.routes.get_mut(request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            None => Ok(HttpResponse {
                status:         404,
                content_length: Some(0),
                body:           Box::new(io::empty()),
            }),
            Some(MockResponse::Fail(message)) => Err(FetchError::Network(message)),
            Some(MockResponse::Stalled { content_length, body }) => Ok(HttpResponse {
                status: 200,
                content_length,
                body: Box::new(Cursor::new(body).chain(TimedOut)),
            }),
            Some(MockResponse::Body {
                status,
                content_length,
                body,
                read_delay,
            }) => Ok(HttpResponse {
                status,
                content_length,
                body: Box::new(SlowReader {
                    inner: Cursor::new(body),
                    delay: read_delay,
                }),
            }),
        }
    }
}

struct SlowReader {
    inner: Cursor<Vec<u8>>,
    delay: Duration,
}

impl Read for SlowReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.delay.is_zero() {
            return self.inner.read(buf);
        }
        thread::sleep(self.delay);
        let limit = buf.len().min(1024);
        self.inner.read(&mut buf[..limit])
    }
}

/// Reader whose peer went silent: every read times out.
struct TimedOut;

impl Read for TimedOut {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_in_order_and_repeats_last() {
        let mock = MockHttpClient::new();
        mock.respond("http://x/a", MockResponse::status(500))
            .respond("http://x/a", MockResponse::ok("done"));

        let first = mock.get(&HttpRequest::get("http://x/a")).unwrap();
        assert_eq!(first.status, 500);
        let second = mock.get(&HttpRequest::get("http://x/a")).unwrap();
        assert_eq!(second.into_string().unwrap(), "done");
        let third = mock.get(&HttpRequest::get("http://x/a")).unwrap();
        assert_eq!(third.status, 200);
        assert_eq!(mock.request_count("http://x/a"), 3);
    }

    #[test]
    fn unknown_url_is_not_found() {
        let mock = MockHttpClient::new();
        let response = mock.get(&HttpRequest::get("http://x/missing")).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn records_query_and_headers() {
        let mock = MockHttpClient::new();
        let query = vec![
            ("types".to_string(), "Checkpoint".to_string()),
            ("types".to_string(), "LORA".to_string()),
        ];
        let headers = vec![("Authorization".to_string(), "Bearer k".to_string())];
        mock.get(&HttpRequest::get("http://x/models").query(&query).headers(&headers))
            .unwrap();

        let seen = &mock.requests()[0];
        assert_eq!(seen.query_values("types"), vec!["Checkpoint", "LORA"]);
        assert_eq!(seen.header("authorization"), Some("Bearer k"));
    }

    #[test]
    fn stalled_body_times_out_after_prefix() {
        let mock = MockHttpClient::new();
        mock.respond("http://x/a", MockResponse::stalled("half", 8));

        let response = mock.get(&HttpRequest::get("http://x/a")).unwrap();
        assert_eq!(response.content_length, Some(8));
        let mut body = response.body;
        let mut prefix = [0u8; 4];
        body.read_exact(&mut prefix).unwrap();
        assert_eq!(&prefix, b"half");
        let err = body.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn transport_failure() {
        let mock = MockHttpClient::new();
        mock.respond("http://x/a", MockResponse::fail("connection refused"));
        assert!(matches!(
            mock.get(&HttpRequest::get("http://x/a")),
            Err(FetchError::Network(_))
        ));
    }
}
