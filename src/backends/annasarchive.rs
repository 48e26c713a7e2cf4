//! Anna's Archive book search

use super::traits::*;
use super::utils::{first_attr, first_text, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use scraper::Html;

const BASE_URL: &str = "https://annas-archive.org";

pub struct AnnasArchive {
    client: HttpClient,
    base_url: String,
}

impl AnnasArchive {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "annasarchive",
        provider: "annasarchive",
        priority: 1,
        category: Category::Books,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let item_selector = selector("a[href^='/md5/']")?;
        let title_selector = selector("h3")?;
        let author_selector = selector("div.italic")?;
        let publisher_selector = selector("div.text-sm")?;
        let info_selector = selector("div.text-xs")?;
        let image_selector = selector("img")?;

        let mut results = Vec::new();
        for item in document.select(&item_selector) {
            let Some(title) = first_text(item, &title_selector) else {
                continue;
            };
            let Some(href) = item.value().attr("href") else {
                continue;
            };

            results.push(
                ResultRecord::new()
                    .with("title", title)
                    .with("author", first_text(item, &author_selector).unwrap_or_default())
                    .with("publisher", first_text(item, &publisher_selector).unwrap_or_default())
                    .with("info", first_text(item, &info_selector).unwrap_or_default())
                    .with("url", format!("{BASE_URL}{href}"))
                    .with("thumbnail", first_attr(item, &image_selector, "src").unwrap_or_default()),
            );
        }
        Ok(results)
    }
}

#[async_trait]
impl Backend for AnnasArchive {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let query = [
            ("q", params.query.clone()),
            ("page", params.page.max(1).to_string()),
        ];

        let response = self
            .client
            .get(&format!("{}/search", self.base_url), &query)
            .await?
            .error_for_status()?;

        Self::parse_results(&response.text)
    }
}
