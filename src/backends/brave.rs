//! Brave search backend

use super::traits::*;
use super::utils::{element_text, first_text, is_absolute_http, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use scraper::Html;

/// Brave web search
pub struct Brave {
    client: HttpClient,
    base_url: String,
}

impl Brave {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "brave",
        provider: "brave",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://search.brave.com/search".to_string(),
        })
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let result_selector = selector("div.snippet[data-type='web']")?;
        let link_selector = selector("a")?;
        let title_selector = selector(".title, .snippet-title")?;
        let snippet_selector = selector(".snippet-description, .generic-snippet .content")?;

        let mut results = Vec::new();
        for element in document.select(&result_selector) {
            let Some(link) = element.select(&link_selector).next() else {
                continue;
            };
            let url = link.value().attr("href").unwrap_or_default();
            let title = first_text(element, &title_selector).unwrap_or_else(|| element_text(link));

            if title.is_empty() || !is_absolute_http(url) {
                continue;
            }

            results.push(
                ResultRecord::new()
                    .with("title", title)
                    .with("href", url)
                    .with("body", first_text(element, &snippet_selector).unwrap_or_default()),
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl Backend for Brave {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![("q", params.query.clone()), ("source", "web".to_string())];

        if params.page > 1 {
            query.push(("offset", (params.page - 1).to_string()));
        }

        if let Some(limit) = params.timelimit {
            let tf = match limit {
                TimeLimit::Day => "pd",
                TimeLimit::Week => "pw",
                TimeLimit::Month => "pm",
                TimeLimit::Year => "py",
            };
            query.push(("tf", tf.to_string()));
        }

        let safesearch = match params.safesearch {
            SafeSearch::On => "strict",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Off => "off",
        };
        query.push(("safesearch", safesearch.to_string()));

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        Self::parse_results(&response.text)
    }
}
