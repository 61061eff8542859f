//! OpenLibrary search and covers client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::config::ApiConfig;
use crate::models::{BookSearchParams, SearchPage};
use crate::sources::{BookSource, SourceError};
use crate::utils::HttpClient;

const OPENLIBRARY_API_BASE: &str = "https://openlibrary.org";
const OPENLIBRARY_COVERS_BASE: &str = "https://covers.openlibrary.org";

/// Fields requested from the search endpoint
pub const SEARCH_FIELDS: &str = "key,title,author_name,first_publish_year,cover_i,subject,isbn,publisher,language,number_of_pages_median";

/// Preset queries offered as quick filters
pub const QUICK_FILTERS: [&str; 8] = [
    "Science",
    "Mathematics",
    "History",
    "Biology",
    "Astronomy",
    "Fiction",
    "Philosophy",
    "Psychology",
];

/// Cover image size accepted by the covers endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverSize {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[default]
    #[serde(rename = "L")]
    Large,
}

impl CoverSize {
    /// Size code used in cover URLs
    pub fn code(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

impl fmt::Display for CoverSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CoverSize {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(CoverSize::Small),
            "M" => Ok(CoverSize::Medium),
            "L" => Ok(CoverSize::Large),
            other => Err(SourceError::InvalidRequest(format!(
                "unknown cover size: {}",
                other
            ))),
        }
    }
}

/// Build a cover URL on the public covers host.
///
/// Returns `None` when there is no cover id. OpenLibrary uses `0` or `-1`
/// for none in some records, so any id below 1 is treated the same way.
pub fn cover_url(cover_id: Option<i64>, size: CoverSize) -> Option<String> {
    cover_url_on(OPENLIBRARY_COVERS_BASE, cover_id, size)
}

fn cover_url_on(base: &str, cover_id: Option<i64>, size: CoverSize) -> Option<String> {
    match cover_id {
        Some(id) if id > 0 => Some(format!(
            "{}/b/id/{}-{}.jpg",
            base.trim_end_matches('/'),
            id,
            size.code()
        )),
        _ => None,
    }
}

/// OpenLibrary book source
///
/// Uses the public `search.json` endpoint. No retries are attempted: a failed
/// page is reported to the caller, which decides whether to try again.
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    client: HttpClient,
    api_base: String,
    covers_base: String,
}

impl OpenLibrarySource {
    /// Create a source against the public OpenLibrary hosts
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            api_base: OPENLIBRARY_API_BASE.to_string(),
            covers_base: OPENLIBRARY_COVERS_BASE.to_string(),
        })
    }

    /// Create a source from API configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, SourceError> {
        let client = match &config.user_agent {
            Some(agent) => HttpClient::with_user_agent(agent, config.timeout())?,
            None => HttpClient::with_timeout(config.timeout())?,
        };
        Ok(Self::with_client(
            client,
            &config.base_url,
            &config.covers_url,
        ))
    }

    /// Create a source from an existing client and base URLs
    pub fn with_client(client: HttpClient, api_base: &str, covers_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            covers_base: covers_base.trim_end_matches('/').to_string(),
        }
    }

    /// Build the search URL for a page of results
    pub fn search_url(&self, params: &BookSearchParams) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("{}/search.json", self.api_base))?;
        url.query_pairs_mut()
            .append_pair("q", &params.query)
            .append_pair("page", &params.page.to_string())
            .append_pair("limit", &params.limit.to_string())
            .append_pair("fields", SEARCH_FIELDS);
        Ok(url)
    }

    /// Cover URL on this source's covers host
    pub fn cover_url(&self, cover_id: Option<i64>, size: CoverSize) -> Option<String> {
        cover_url_on(&self.covers_base, cover_id, size)
    }

    fn validate(params: &BookSearchParams) -> Result<(), SourceError> {
        if params.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("empty query".to_string()));
        }
        if params.page == 0 {
            return Err(SourceError::InvalidRequest(
                "page numbers start at 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BookSource for OpenLibrarySource {
    fn id(&self) -> &str {
        "openlibrary"
    }

    fn name(&self) -> &str {
        "OpenLibrary"
    }

    async fn search(&self, params: &BookSearchParams) -> Result<SearchPage, SourceError> {
        Self::validate(params)?;
        let url = self.search_url(params)?;
        tracing::debug!(query = %params.query, page = params.page, "OpenLibrary search");

        let client: &Client = self.client.client();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search OpenLibrary: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        let page: SearchPage = serde_json::from_str(&body)?;
        tracing::debug!(
            query = %params.query,
            page = params.page,
            docs = page.docs.len(),
            num_found = page.num_found,
            "OpenLibrary search complete"
        );
        Ok(page)
    }
}
