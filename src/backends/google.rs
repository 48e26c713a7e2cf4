//! Google search backend

use super::traits::*;
use super::utils::{element_text, first_text, is_absolute_http, query_param, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use scraper::Html;

/// Google web search
pub struct Google {
    client: HttpClient,
    base_url: String,
}

impl Google {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "google",
        provider: "google",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://www.google.com/search".to_string(),
        })
    }

    /// Unwrap `/url?q=<target>` redirect links
    fn resolve_href(href: &str) -> Option<String> {
        if href.starts_with("/url?") {
            return query_param(&format!("https://www.google.com{href}"), "q");
        }
        is_absolute_http(href).then(|| href.to_string())
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let result_selector = selector("div.g, div.Gx5Zad")?;
        let title_selector = selector("h3")?;
        let link_selector = selector("a[href]")?;
        let snippet_selector = selector("div.VwiC3b, span.aCOpRe, div.BNeawe.s3v9rd")?;

        let mut results = Vec::new();
        for element in document.select(&result_selector) {
            let Some(title) = element.select(&title_selector).next().map(element_text) else {
                continue;
            };

            let href = element
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .find_map(Self::resolve_href);

            let Some(href) = href else {
                continue;
            };
            if title.is_empty() || href.contains("google.com/") {
                continue;
            }

            results.push(
                ResultRecord::new()
                    .with("title", title)
                    .with("href", href)
                    .with("body", first_text(element, &snippet_selector).unwrap_or_default()),
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl Backend for Google {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![
            ("q", params.query.clone()),
            ("hl", params.language().to_string()),
            ("gl", params.country().to_string()),
            ("num", "10".to_string()),
            ("start", ((params.page.max(1) - 1) * 10).to_string()),
        ];

        let safe = match params.safesearch {
            SafeSearch::On => "active",
            SafeSearch::Moderate => "medium",
            SafeSearch::Off => "off",
        };
        query.push(("safe", safe.to_string()));

        if let Some(limit) = params.timelimit {
            query.push(("tbs", format!("qdr:{}", limit.code())));
        }

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        if response.url.contains("/sorry/") || response.is_captcha() {
            return Err(BackendError::Ratelimit("google requested a captcha".into()));
        }

        Self::parse_results(&response.text)
    }
}
