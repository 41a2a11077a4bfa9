//! I/O operations for HTTP fetching.

mod fetcher;
mod http;
mod mock;

pub use fetcher::{FetchReport, FetchStatus, Fetcher};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use mock::{MockHttpClient, MockResponse, RecordedRequest};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
