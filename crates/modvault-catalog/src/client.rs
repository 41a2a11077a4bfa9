//! Cursor-following listing of the remote catalog.

use modvault_fetch::{FetchError, HttpClient, HttpRequest, RetryPolicy};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::model::{CatalogEntry, ModelType};

pub const DEFAULT_API_URL: &str = "https://civitai.com/api/v1/models";
pub const DEFAULT_USER_AGENT: &str = "modvault - API Client";

/// Categories to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    included: Vec<ModelType>,
}

impl Default for TypeFilter {
    fn default() -> Self { Self::all() }
}

impl TypeFilter {
    pub fn all() -> Self {
        Self {
            included: ModelType::ALL.to_vec(),
        }
    }

    pub fn new(included: impl IntoIterator<Item = ModelType>) -> Self {
        let mut filter = Self { included: Vec::new() };
        for t in included {
            if !filter.included.contains(&t) {
                filter.included.push(t);
            }
        }
        filter
    }

    pub fn included(&self) -> &[ModelType] { &self.included }

    /// `types` values to send, or `None` when the listing should not be
    /// filtered. Selecting every category, or none at all, means no filter.
    pub fn query_values(&self) -> Option<Vec<&str>> {
        let covers_all = ModelType::ALL.iter().all(|t| self.included.contains(t));
        if covers_all || self.included.is_empty() {
            None
        } else {
            Some(self.included.iter().map(ModelType::as_str).collect())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub api_url:         String,
    pub types:           TypeFilter,
    pub favorites_only:  bool,
    pub api_key:         Option<String>,
    pub first_page_only: bool,
    pub limit:           u32,
    pub sort:            String,
    pub user_agent:      String,
    pub retry:           RetryPolicy,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            api_url:         DEFAULT_API_URL.to_string(),
            types:           TypeFilter::all(),
            favorites_only:  false,
            api_key:         None,
            first_page_only: false,
            limit:           100,
            sort:            "Newest".to_string(),
            user_agent:      DEFAULT_USER_AGENT.to_string(),
            retry:           RetryPolicy::default(),
        }
    }
}

/// One decoded page of the listing.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// 1-based position in this run.
    pub number:      u32,
    pub entries:     Vec<CatalogEntry>,
    /// Items on this page that did not decode and were dropped.
    pub rejected:    usize,
    pub total_pages: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    items:    Vec<Value>,
    #[serde(default)]
    metadata: Option<PageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetadata {
    next_page:   Option<String>,
    total_pages: Option<u64>,
    total_items: Option<u64>,
}

pub struct CatalogClient<C: HttpClient> {
    client:  C,
    options: ListingOptions,
}

impl<C: HttpClient> CatalogClient<C> {
    pub fn new(client: C, options: ListingOptions) -> Result<Self> {
        let has_key = options.api_key.as_deref().is_some_and(|k| !k.is_empty());
        if options.favorites_only && !has_key {
            return Err(CatalogError::MissingCredential);
        }
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &ListingOptions { &self.options }

    /// Query of the first request; later pages follow the returned cursor URL.
    pub fn first_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("limit".to_string(), self.options.limit.to_string()),
            ("page".to_string(), "1".to_string()),
            ("sort".to_string(), self.options.sort.clone()),
        ];
        if let Some(types) = self.options.types.query_values() {
            query.extend(types.into_iter().map(|t| ("types".to_string(), t.to_string())));
        }
        if self.options.favorites_only {
            query.push(("favorites".to_string(), "true".to_string()));
        }
        query
    }

    /// Headers sent with every listing request.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_string(), self.options.user_agent.clone())];
        if self.options.favorites_only
            && let Some(key) = &self.options.api_key
        {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }
        headers
    }

    /// Lazily walk the listing from its first page.
    pub fn pages(&self) -> Pages<'_, C> {
        match self.options.types.query_values() {
            Some(types) => info!("requesting catalog types: {}", types.join(", ")),
            None => info!("requesting every catalog type"),
        }
        Pages {
            catalog: self,
            next:    Some(PageRequest::First),
            fetched: 0,
            headers: self.headers(),
        }
    }

    /// Lazily yield entries across all pages.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry> + '_ {
        self.pages().flat_map(|page| page.entries)
    }

    fn fetch_page(&self, url: &str, query: &[(String, String)], headers: &[(String, String)]) -> std::result::Result<String, FetchError> {
        let request = HttpRequest::get(url).query(query).headers(headers);
        let response = self.client.get(&request)?;
        if !response.is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status,
                url:    url.to_string(),
            });
        }
        response
            .into_string()
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRequest {
    First,
    Cursor(String),
}

/// Iterator over catalog pages.
///
/// Ends after the terminal page, after the first page in first-page-only
/// mode, or as soon as a page cannot be obtained or decoded; in the last case
/// the pages already yielded stand as a partial listing.
pub struct Pages<'a, C: HttpClient> {
    catalog: &'a CatalogClient<C>,
    next:    Option<PageRequest>,
    fetched: u32,
    headers: Vec<(String, String)>,
}

impl<C: HttpClient> Pages<'_, C> {
    fn decode(&self, number: u32, body: &str) -> Result<(CatalogPage, Option<String>)> {
        let response: PageResponse = serde_json::from_str(body)
            .map_err(|e| CatalogError::data_shape(format!("catalog page {number}"), e))?;
        let metadata = response.metadata.unwrap_or_default();
        debug!(
            page = number,
            total_pages = ?metadata.total_pages,
            total_items = ?metadata.total_items,
            "catalog page received"
        );

        let mut entries = Vec::with_capacity(response.items.len());
        let mut rejected = 0;
        for item in response.items {
            match CatalogEntry::from_value(item) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("skipping undecodable item on page {number}: {e}");
                    rejected += 1;
                }
            }
        }

        let page = CatalogPage {
            number,
            entries,
            rejected,
            total_pages: metadata.total_pages,
        };
        Ok((page, metadata.next_page))
    }
}

impl<C: HttpClient> Iterator for Pages<'_, C> {
    type Item = CatalogPage;

    fn next(&mut self) -> Option<CatalogPage> {
        let request = self.next.take()?;
        let number = self.fetched + 1;
        let options = &self.catalog.options;

        let (url, query) = match &request {
            PageRequest::First => (options.api_url.as_str(), self.catalog.first_query()),
            PageRequest::Cursor(url) => (url.as_str(), Vec::new()),
        };

        let label = format!("catalog page {number}");
        let body = match options
            .retry
            .run(&label, |_| self.catalog.fetch_page(url, &query, &self.headers))
        {
            Ok(body) => body,
            Err(e) => {
                warn!("giving up on {label} ({url}): {e}; continuing with the pages already listed");
                return None;
            }
        };

        let (page, cursor) = match self.decode(number, &body) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("{e}; continuing with the pages already listed");
                return None;
            }
        };
        self.fetched = number;

        if !options.first_page_only {
            self.next = cursor.map(PageRequest::Cursor);
        }
        Some(page)
    }
}
