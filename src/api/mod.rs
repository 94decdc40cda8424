//! Client Endpoint Wrappers
//!
//! Same-origin GET calls to the defaults and search endpoints. Both fail
//! soft: errors are logged here and never reach the caller.

mod defaults;
mod search;

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use web_sys::RequestCredentials;

use crate::config::EngineConfig;
use crate::error::{AutofillError, AutofillResult};
use crate::models::{ClientDefaults, ClientId, SearchPage};

pub use defaults::decode_defaults;
pub use search::decode_search;

/// Transport seam used by the reconciler and the typeahead
#[async_trait(?Send)]
pub trait ClientApi {
    /// Defaults for a client, or `None` on any failure
    async fn fetch_defaults(&self, client_id: ClientId) -> Option<ClientDefaults>;

    /// One page of matches; the empty (failed) page on any failure
    async fn search_clients(&self, query: &str, limit: u32) -> SearchPage;
}

/// Browser implementation over `fetch`
#[derive(Debug, Clone)]
pub struct HttpClientApi {
    config: EngineConfig,
}

impl HttpClientApi {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    async fn try_fetch_defaults(&self, client_id: ClientId) -> AutofillResult<ClientDefaults> {
        let url = self.config.defaults_url_for(client_id);
        let response = get_json(Request::get(&url)).await?;
        let (status, content_type, body) = read(response).await?;
        decode_defaults(status, &content_type, &body)
    }

    async fn try_search(&self, query: &str, limit: u32) -> AutofillResult<SearchPage> {
        let limit = limit.to_string();
        let builder = Request::get(&self.config.search_url).query([("q", query), ("limit", limit.as_str())]);
        let response = get_json(builder).await?;
        let (status, content_type, body) = read(response).await?;
        decode_search(status, &content_type, &body)
    }
}

#[async_trait(?Send)]
impl ClientApi for HttpClientApi {
    async fn fetch_defaults(&self, client_id: ClientId) -> Option<ClientDefaults> {
        match self.try_fetch_defaults(client_id).await {
            Ok(defaults) => Some(defaults),
            Err(e) => {
                log::warn!("[DEFAULTS] client {}: {}", client_id, e);
                None
            }
        }
    }

    async fn search_clients(&self, query: &str, limit: u32) -> SearchPage {
        match self.try_search(query, limit).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("[SEARCH] q={:?}: {}", query, e);
                SearchPage::unavailable()
            }
        }
    }
}

// ========================
// Shared helpers
// ========================

async fn get_json(builder: gloo_net::http::RequestBuilder) -> AutofillResult<Response> {
    let response = builder
        .credentials(RequestCredentials::SameOrigin)
        .header("Accept", "application/json")
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await?;
    Ok(response)
}

async fn read(response: Response) -> AutofillResult<(u16, String, String)> {
    let status = response.status();
    let content_type = response.headers().get("content-type").unwrap_or_default();
    let body = response.text().await?;
    Ok((status, content_type, body))
}

/// Status and content-type checks shared by both endpoints
pub(crate) fn ensure_json(status: u16, content_type: &str, body: &str) -> AutofillResult<()> {
    if !(200..300).contains(&status) {
        return Err(AutofillError::transport(Some(status), "non-success status"));
    }
    let declared_json = content_type.to_ascii_lowercase().contains("json");
    if !content_type.is_empty() && !declared_json {
        return Err(AutofillError::format(content_type, "expected JSON"));
    }
    if body.trim_start().starts_with('<') {
        return Err(AutofillError::format(content_type, "markup where JSON was expected"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_json_status() {
        let err = ensure_json(500, "application/json", "{}").unwrap_err();
        assert_eq!(err, AutofillError::transport(Some(500), "non-success status"));
        assert!(ensure_json(204, "application/json", "{}").is_ok());
    }

    #[test]
    fn test_ensure_json_login_redirect() {
        let err = ensure_json(200, "text/html; charset=utf-8", "<!DOCTYPE html><form>").unwrap_err();
        assert!(matches!(err, AutofillError::Format { .. }));
    }

    #[test]
    fn test_ensure_json_sniffs_markup_without_content_type() {
        let err = ensure_json(200, "", "  <html>").unwrap_err();
        assert!(matches!(err, AutofillError::Format { .. }));
        assert!(ensure_json(200, "", r#"{"ok":true}"#).is_ok());
    }
}
