//! Wikipedia search backend

use super::traits::*;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;

/// Wikipedia full-text search via the MediaWiki API
pub struct Wikipedia {
    client: HttpClient,
    api_url: String,
}

impl Wikipedia {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "wikipedia",
        provider: "wikipedia",
        priority: 2,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            api_url: "https://{lang}.wikipedia.org/w/api.php".to_string(),
        })
    }

    /// Override the API endpoint (`{lang}` is substituted)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn get_api_url(&self, lang: &str) -> String {
        self.api_url.replace("{lang}", lang)
    }

    fn parse_response(json: &serde_json::Value) -> Vec<ResultRecord> {
        let Some(pages) = json
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
        else {
            return Vec::new();
        };

        // Sort by index to maintain search relevance order
        let mut page_list: Vec<_> = pages.values().collect();
        page_list.sort_by_key(|page| page.get("index").and_then(|i| i.as_i64()).unwrap_or(999));

        page_list
            .into_iter()
            .filter_map(|page| {
                let title = page.get("title").and_then(|t| t.as_str())?;
                let url = page.get("fullurl").and_then(|u| u.as_str())?;
                if title.is_empty() || url.is_empty() {
                    return None;
                }

                let extract = page
                    .get("extract")
                    .and_then(|e| e.as_str())
                    .unwrap_or_default();
                // Skip disambiguation stubs
                if extract.ends_with("may refer to:") {
                    return None;
                }

                Some(
                    ResultRecord::new()
                        .with("title", title)
                        .with("href", url)
                        .with("body", truncate(extract, 500)),
                )
            })
            .collect()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[async_trait]
impl Backend for Wikipedia {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let offset = (params.page.max(1) - 1) * 10;
        let query = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("generator", "search".to_string()),
            ("gsrsearch", params.query.clone()),
            ("gsrlimit", "10".to_string()),
            ("gsroffset", offset.to_string()),
            ("prop", "extracts|info".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("exlimit", "10".to_string()),
            ("inprop", "url".to_string()),
        ];

        let response = self
            .client
            .get(&self.get_api_url(params.language()), &query)
            .await?
            .error_for_status()?;

        let json: serde_json::Value = response.json()?;
        Ok(Self::parse_response(&json))
    }
}
