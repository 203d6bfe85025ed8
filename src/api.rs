//! Typed client for the manifesto HTTP endpoints
//!
//! Wraps a [`Transport`] with the endpoint layout the server exposes:
//! listing, search, cursor pages, the running total and the session user.

use crate::error::{FeedError, Result};
use crate::link::parse_next_link;
use crate::signatory::{Identity, RawSignatory, SignedAt};
use crate::transport::{HttpResponse, Method, Transport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page of signatories plus the cursor to the next
#[derive(Debug, Clone, Default)]
pub struct SignatoryPage {
    pub signatories: Vec<RawSignatory>,
    /// Next page URL from the `Link` header, if any
    pub next: Option<String>,
}

/// The logged in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub identity: Identity,
    /// Present once the user has signed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<SignedAt>,
}

impl User {
    pub fn has_signed(&self) -> bool {
        self.signed.is_some()
    }
}

#[derive(Deserialize)]
struct TotalResponse {
    total: u64,
}

/// HTTP client for the manifesto API
///
/// # Example
///
/// ```rust,no_run
/// use signatory_feed::{ManifestoApi, ReqwestTransport};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new(Duration::from_secs(30))?;
/// let api = ManifestoApi::new(transport, "https://www.reactivemanifesto.org");
///
/// let total = api.total().await?;
/// let first = api.list(30).await?;
/// if let Some(cursor) = first.next {
///     let second = api.page(&cursor).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct ManifestoApi<T> {
    transport: Arc<T>,
    base_url: String,
}

impl<T> Clone for ManifestoApi<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
        }
    }
}

impl<T: Transport> ManifestoApi<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(transport), base_url)
    }

    pub fn from_shared(transport: Arc<T>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL for a path or an already absolute URL
    pub fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else if path_or_url.starts_with('/') {
            format!("{}{}", self.base_url, path_or_url)
        } else {
            format!("{}/{}", self.base_url, path_or_url)
        }
    }

    // ==================== Signatories ====================

    /// Total number of signatories
    pub async fn total(&self) -> Result<u64> {
        let response = self.send(Method::Get, "/signatories/total").await?;
        let body: TotalResponse = response.json()?;
        Ok(body.total)
    }

    /// First page of the default listing, most recent first
    pub async fn list(&self, per_page: u32) -> Result<SignatoryPage> {
        self.fetch_page(&format!("/signatories?per_page={}", per_page))
            .await
    }

    /// First page of search results for `term`
    pub async fn search(&self, term: &str) -> Result<SignatoryPage> {
        self.fetch_page(&format!("/search?query={}", urlencoding::encode(term)))
            .await
    }

    /// Follow a pagination cursor
    pub async fn page(&self, cursor: &str) -> Result<SignatoryPage> {
        self.fetch_page(cursor).await
    }

    // ==================== Session ====================

    /// Current session user, `None` when logged out
    pub async fn current_user(&self) -> Result<Option<User>> {
        let response = self.send(Method::Get, "/user").await?;
        Self::optional_user(&response)
    }

    /// Sign the manifesto as the current user
    pub async fn sign(&self) -> Result<Option<User>> {
        let response = self.send(Method::Put, "/user/sign").await?;
        Self::optional_user(&response)
    }

    /// Withdraw the current user's signature
    pub async fn unsign(&self) -> Result<Option<User>> {
        let response = self.send(Method::Delete, "/user/sign").await?;
        Self::optional_user(&response)
    }

    /// End the session
    pub async fn logout(&self) -> Result<()> {
        self.send(Method::Delete, "/user").await?;
        Ok(())
    }

    // ==================== Helper Methods ====================

    async fn send(&self, method: Method, path_or_url: &str) -> Result<HttpResponse> {
        let url = self.resolve(path_or_url);
        self.transport.send(method, &url).await?.error_for_status()
    }

    async fn fetch_page(&self, path_or_url: &str) -> Result<SignatoryPage> {
        let response = self.send(Method::Get, path_or_url).await?;
        let signatories: Vec<RawSignatory> = response.json().map_err(|e| {
            FeedError::InvalidResponse(format!("signatory page from {}: {}", path_or_url, e))
        })?;
        let next = parse_next_link(response.joined_header("link").as_deref());

        Ok(SignatoryPage { signatories, next })
    }

    fn optional_user(response: &HttpResponse) -> Result<Option<User>> {
        if response.is_empty() {
            return Ok(None);
        }
        // `null` decodes to None as well
        response.json()
    }
}
