//! Mojeek search backend

use super::traits::*;
use super::utils::{element_text, first_text, is_absolute_http, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use scraper::Html;

pub struct Mojeek {
    client: HttpClient,
    base_url: String,
}

impl Mojeek {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "mojeek",
        provider: "mojeek",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://www.mojeek.com/search".to_string(),
        })
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let item_selector = selector("ul.results-standard > li")?;
        let title_selector = selector("h2 a, a.title")?;
        let snippet_selector = selector("p.s")?;

        Ok(document
            .select(&item_selector)
            .filter_map(|item| {
                let link = item.select(&title_selector).next()?;
                let href = link.value().attr("href")?;
                let title = element_text(link);
                (is_absolute_http(href) && !title.is_empty()).then(|| {
                    ResultRecord::new()
                        .with("title", title)
                        .with("href", href)
                        .with("body", first_text(item, &snippet_selector).unwrap_or_default())
                })
            })
            .collect())
    }
}

#[async_trait]
impl Backend for Mojeek {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![("q", params.query.clone())];
        if params.safesearch == SafeSearch::On {
            query.push(("safe", "1".to_string()));
        }
        if params.page > 1 {
            query.push(("s", ((params.page - 1) * 10 + 1).to_string()));
        }
        let country = params.country();
        if country != "wt" {
            query.push(("arc", country.to_string()));
            query.push(("lb", params.language().to_string()));
        }

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        Self::parse_results(&response.text)
    }
}
