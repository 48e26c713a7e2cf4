//! Yahoo search backend (served by Bing)

use super::traits::*;
use super::utils::{element_text, first_text, selector};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use scraper::Html;

pub struct Yahoo {
    client: HttpClient,
    base_url: String,
}

/// Extract the target from `r.search.yahoo.com/.../RU=<encoded>/RK=...` links
fn extract_target(href: &str) -> Option<String> {
    if !href.contains("r.search.yahoo.com") {
        return Some(href.to_string());
    }
    let start = href.find("/RU=")? + 4;
    let rest = &href[start..];
    let encoded = rest.split("/R").next().unwrap_or(rest);
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

impl Yahoo {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "yahoo",
        provider: "bing",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://search.yahoo.com/search".to_string(),
        })
    }

    fn parse_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let item_selector = selector("div.algo-sr, div.algo")?;
        let title_selector = selector("h3 a, div.compTitle a")?;
        let snippet_selector = selector("div.compText")?;

        let mut results = Vec::new();
        for item in document.select(&item_selector) {
            let Some(link) = item.select(&title_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href").and_then(extract_target) else {
                continue;
            };
            let title = element_text(link);
            if title.is_empty() || href.contains("yahoo.com/") {
                continue;
            }

            results.push(
                ResultRecord::new()
                    .with("title", title)
                    .with("href", href)
                    .with("body", first_text(item, &snippet_selector).unwrap_or_default()),
            );
        }
        Ok(results)
    }
}

#[async_trait]
impl Backend for Yahoo {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![("p", params.query.clone())];
        if params.page > 1 {
            query.push(("b", ((params.page - 1) * 7 + 1).to_string()));
        }
        if let Some(limit) = params.timelimit {
            query.push(("btf", limit.code().to_string()));
        }

        let response = self
            .client
            .get(&self.base_url, &query)
            .await?
            .error_for_status()?;

        Self::parse_results(&response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_target() {
        let href = "https://r.search.yahoo.com/_ylt=abc/RV=2/RE=1/RO=10/RU=https%3a%2f%2fdocs.rs%2f/RK=2/RS=xyz-";
        assert_eq!(extract_target(href).as_deref(), Some("https://docs.rs/"));
        assert_eq!(
            extract_target("https://plain.example/").as_deref(),
            Some("https://plain.example/")
        );
    }

    #[test]
    fn test_parse_results() {
        let html = r#"
            <div class="algo-sr">
              <h3><a href="https://r.search.yahoo.com/_ylt=a/RU=https%3a%2f%2fdocs.rs%2f/RK=2/RS=b">Docs.rs</a></h3>
              <div class="compText">Documentation host.</div>
            </div>
        "#;
        let results = Yahoo::parse_results(html).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get_str("href"), Some("https://docs.rs/"));
    }
}
