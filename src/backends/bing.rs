//! Bing backends (web and news)

use super::traits::*;
use super::utils::{element_text, first_attr, first_text, is_absolute_http, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use base64::Engine as _;
use scraper::Html;

/// Decode Bing's click-tracking URLs
///
/// Links look like `https://www.bing.com/ck/a?...&u=a1<base64>&...`; the real
/// target is the base64 payload after the `a1` prefix.
fn decode_bing_url(url: &str) -> String {
    if !url.starts_with("https://www.bing.com/ck/a?") {
        return url.to_string();
    }

    let Some(encoded) = super::utils::query_param(url, "u") else {
        return url.to_string();
    };
    let Some(payload) = encoded.strip_prefix("a1") else {
        return url.to_string();
    };

    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| url.to_string())
}

/// Bing web search
pub struct Bing {
    client: HttpClient,
    base_url: String,
}

impl Bing {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "bing",
        provider: "bing",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://www.bing.com/search".to_string(),
        })
    }

    /// Override the search endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let result_selector = selector("#b_results > li.b_algo")?;
        let title_selector = selector("h2 a")?;
        let snippet_selector = selector("p")?;

        let mut results = Vec::new();
        for element in document.select(&result_selector) {
            let Some(title_elem) = element.select(&title_selector).next() else {
                continue;
            };

            let title = element_text(title_elem);
            let raw_url = title_elem.value().attr("href").unwrap_or_default();
            if title.is_empty() || !is_absolute_http(raw_url) {
                continue;
            }

            results.push(
                ResultRecord::new()
                    .with("title", title)
                    .with("href", decode_bing_url(raw_url))
                    .with("body", first_text(element, &snippet_selector).unwrap_or_default()),
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl Backend for Bing {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![
            ("q", params.query.clone()),
            ("setlang", params.language().to_string()),
            ("cc", params.country().to_string()),
        ];

        if params.page > 1 {
            query.push(("first", ((params.page - 1) * 10 + 1).to_string()));
        }

        if let Some(limit) = params.timelimit {
            let filters = match limit {
                TimeLimit::Day => "ex1:\"ez1\"",
                TimeLimit::Week => "ex1:\"ez2\"",
                TimeLimit::Month => "ex1:\"ez3\"",
                TimeLimit::Year => "ex1:\"ez5\"",
            };
            query.push(("filters", filters.to_string()));
        }

        let adlt = match params.safesearch {
            SafeSearch::On => "strict",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Off => "off",
        };
        query.push(("adlt", adlt.to_string()));

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        if response.is_captcha() {
            return Err(BackendError::Ratelimit("bing served a captcha".into()));
        }

        Self::parse_results(&response.text)
    }
}

/// Bing news search
pub struct BingNews {
    client: HttpClient,
    base_url: String,
}

impl BingNews {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "bing_news",
        provider: "bing",
        priority: 1,
        category: Category::News,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://www.bing.com/news/infinitescrollajax".to_string(),
        })
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let card_selector = selector("div.news-card")?;
        let snippet_selector = selector("div.snippet")?;
        let image_selector = selector("img")?;
        let date_selector = selector("span[aria-label]")?;

        let mut results = Vec::new();
        for card in document.select(&card_selector) {
            let attrs = card.value();
            let url = attrs.attr("url").unwrap_or_default();
            let title = attrs.attr("data-title").unwrap_or_default();
            if url.is_empty() || title.is_empty() {
                continue;
            }

            let image = first_attr(card, &image_selector, "src")
                .filter(|src| is_absolute_http(src))
                .unwrap_or_default();
            let date = card
                .select(&date_selector)
                .next()
                .and_then(|e| e.value().attr("aria-label"))
                .unwrap_or_default();

            results.push(
                ResultRecord::new()
                    .with("date", date)
                    .with("title", title)
                    .with("body", first_text(card, &snippet_selector).unwrap_or_default())
                    .with("url", url)
                    .with("image", image)
                    .with("source", attrs.attr("data-author").unwrap_or_default()),
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl Backend for BingNews {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![
            ("InfiniteScroll", "1".to_string()),
            ("q", params.query.clone()),
            ("first", ((params.page.max(1) - 1) * 10 + 1).to_string()),
            ("setlang", params.language().to_string()),
            ("cc", params.country().to_string()),
        ];
        if let Some(limit) = params.timelimit {
            let interval = match limit {
                TimeLimit::Day => "7",
                TimeLimit::Week => "8",
                TimeLimit::Month => "9",
                TimeLimit::Year => "9",
            };
            query.push(("qft", format!("interval=\"{interval}\"")));
        }

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        Self::parse_results(&response.text)
    }
}
