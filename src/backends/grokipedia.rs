//! Grokipedia search backend

use super::traits::*;
use super::utils::normalize_text;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use serde::Deserialize;

const PAGE_SIZE: u32 = 10;

pub struct Grokipedia {
    client: HttpClient,
    api_url: String,
    page_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    slug: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl Grokipedia {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "grokipedia",
        provider: "grokipedia",
        priority: 2,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            api_url: "https://grokipedia.com/api/full-text-search".to_string(),
            page_url: "https://grokipedia.com/page/".to_string(),
        })
    }

    fn to_records(&self, response: SearchResponse) -> Vec<ResultRecord> {
        response
            .results
            .into_iter()
            .filter(|a| !a.slug.is_empty())
            .map(|a| {
                let title = if a.title.is_empty() {
                    a.slug.replace('_', " ")
                } else {
                    a.title
                };
                ResultRecord::new()
                    .with("title", title)
                    .with("href", format!("{}{}", self.page_url, a.slug))
                    .with("body", normalize_text(&a.snippet))
            })
            .collect()
    }
}

#[async_trait]
impl Backend for Grokipedia {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let query = [
            ("query", params.query.clone()),
            ("limit", PAGE_SIZE.to_string()),
            ("offset", ((params.page.max(1) - 1) * PAGE_SIZE).to_string()),
        ];
        let response = self
            .client
            .get(&self.api_url, &query)
            .await?
            .error_for_status()?;

        Ok(self.to_records(response.json()?))
    }
}
