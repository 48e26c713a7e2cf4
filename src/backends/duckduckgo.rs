//! DuckDuckGo backends
//!
//! Text results come from the HTML endpoint. Images, news and videos use the
//! JSON endpoints, which need a `vqd` token obtained from the landing page.

use super::traits::*;
use super::utils::{element_text, first_text, query_param, selector, strip_html};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::Value;

static VQD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"vqd=["']?([\d-]+)["']?"#).expect("valid vqd regex"));

const BASE_URL: &str = "https://duckduckgo.com";

/// Map safe search onto DuckDuckGo's `p` parameter
fn safesearch_param(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::On => "1",
        SafeSearch::Moderate => "",
        SafeSearch::Off => "-1",
    }
}

/// Fetch the `vqd` token required by the JSON endpoints
async fn fetch_vqd(client: &HttpClient, base_url: &str, query: &str) -> Result<String, BackendError> {
    let response = client
        .get(&format!("{base_url}/"), &[("q", query.to_string())])
        .await?
        .error_for_status()?;

    VQD.captures(&response.text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| BackendError::Parse("vqd token not found".to_string()))
}

/// Read the `results` array of a JSON endpoint response
fn json_results(text: &str) -> Result<Vec<Value>, BackendError> {
    let json: Value = serde_json::from_str(text)?;
    Ok(json
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// DuckDuckGo web search (HTML endpoint, served by Bing)
pub struct DuckDuckGo {
    client: HttpClient,
    html_url: String,
}

impl DuckDuckGo {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "duckduckgo",
        provider: "bing",
        priority: 1,
        category: Category::Text,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            html_url: "https://html.duckduckgo.com/html/".to_string(),
        })
    }

    fn parse_html_results(html: &str) -> Result<Vec<ResultRecord>, BackendError> {
        let document = Html::parse_document(html);
        let result_selector = selector("div.result")?;
        let title_selector = selector("a.result__a")?;
        let snippet_selector = selector("a.result__snippet")?;

        let mut results = Vec::new();
        for element in document.select(&result_selector) {
            let Some(title_elem) = element.select(&title_selector).next() else {
                continue;
            };

            let title = element_text(title_elem);
            let raw_href = title_elem.value().attr("href").unwrap_or_default();
            // Redirect links carry the target in `uddg`
            let href = query_param(raw_href, "uddg").unwrap_or_else(|| raw_href.to_string());

            // Skip ads and internal links
            if title.is_empty() || href.is_empty() || href.contains("duckduckgo.com/y.js") {
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
impl Backend for DuckDuckGo {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut form = vec![
            ("q", params.query.clone()),
            ("b", String::new()),
            ("kl", params.region.clone()),
        ];
        if params.page > 1 {
            form.push(("s", (10 + (params.page - 2) * 15).to_string()));
        }
        if let Some(limit) = params.timelimit {
            form.push(("df", limit.code().to_string()));
        }

        let response = self
            .client
            .post_form(&self.html_url, &form)
            .await?
            .error_for_status()?;

        if response.status == 202 || response.is_captcha() {
            return Err(BackendError::Ratelimit("duckduckgo served a challenge page".into()));
        }

        Self::parse_html_results(&response.text)
    }
}

/// DuckDuckGo image search
pub struct DuckDuckGoImages {
    client: HttpClient,
    base_url: String,
}

impl DuckDuckGoImages {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "duckduckgo_images",
        provider: "bing",
        priority: 1,
        category: Category::Images,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    fn to_record(item: &Value) -> Option<ResultRecord> {
        let image = str_field(item, "image");
        if image.is_empty() {
            return None;
        }
        Some(
            ResultRecord::new()
                .with("title", str_field(item, "title"))
                .with("image", image)
                .with("thumbnail", str_field(item, "thumbnail"))
                .with("url", str_field(item, "url"))
                .with("height", item.get("height").cloned().unwrap_or(Value::Null))
                .with("width", item.get("width").cloned().unwrap_or(Value::Null))
                .with("source", str_field(item, "source")),
        )
    }
}

#[async_trait]
impl Backend for DuckDuckGoImages {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let vqd = fetch_vqd(&self.client, &self.base_url, &params.query).await?;
        let timelimit = params
            .timelimit
            .map(|t| match t {
                TimeLimit::Day => "Day",
                TimeLimit::Week => "Week",
                TimeLimit::Month => "Month",
                TimeLimit::Year => "Year",
            })
            .unwrap_or_default();
        let filters = ["size", "color", "type_image", "layout", "license_image"]
            .iter()
            .map(|key| params.extra.get(*key).cloned().unwrap_or_default())
            .collect::<Vec<_>>();

        let query = [
            ("l", params.region.clone()),
            ("o", "json".to_string()),
            ("q", params.query.clone()),
            ("vqd", vqd),
            (
                "f",
                format!(
                    "time:{timelimit},size:{},color:{},type:{},layout:{},license:{}",
                    filters[0], filters[1], filters[2], filters[3], filters[4]
                ),
            ),
            ("p", safesearch_param(params.safesearch).to_string()),
            ("s", ((params.page.max(1) - 1) * 100).to_string()),
        ];

        let response = self
            .client
            .get(&format!("{}/i.js", self.base_url), &query)
            .await?
            .error_for_status()?;

        Ok(json_results(&response.text)?
            .iter()
            .filter_map(Self::to_record)
            .collect())
    }
}

/// DuckDuckGo news search
pub struct DuckDuckGoNews {
    client: HttpClient,
    base_url: String,
}

impl DuckDuckGoNews {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "duckduckgo_news",
        provider: "bing",
        priority: 1,
        category: Category::News,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    fn to_record(item: &Value) -> Option<ResultRecord> {
        let url = str_field(item, "url");
        if url.is_empty() {
            return None;
        }
        let date = item
            .get("date")
            .and_then(Value::as_i64)
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        Some(
            ResultRecord::new()
                .with("date", date)
                .with("title", str_field(item, "title"))
                .with("body", strip_html(str_field(item, "excerpt")))
                .with("url", url)
                .with("image", str_field(item, "image"))
                .with("source", str_field(item, "source")),
        )
    }
}

#[async_trait]
impl Backend for DuckDuckGoNews {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let vqd = fetch_vqd(&self.client, &self.base_url, &params.query).await?;
        let mut query = vec![
            ("l", params.region.clone()),
            ("o", "json".to_string()),
            ("noamp", "1".to_string()),
            ("q", params.query.clone()),
            ("vqd", vqd),
            ("p", safesearch_param(params.safesearch).to_string()),
        ];
        if let Some(limit) = params.timelimit {
            query.push(("df", limit.code().to_string()));
        }
        if params.page > 1 {
            query.push(("s", ((params.page - 1) * 30).to_string()));
        }

        let response = self
            .client
            .get(&format!("{}/news.js", self.base_url), &query)
            .await?
            .error_for_status()?;

        Ok(json_results(&response.text)?
            .iter()
            .filter_map(Self::to_record)
            .collect())
    }
}

/// DuckDuckGo video search
pub struct DuckDuckGoVideos {
    client: HttpClient,
    base_url: String,
}

impl DuckDuckGoVideos {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "duckduckgo_videos",
        provider: "bing",
        priority: 1,
        category: Category::Videos,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    fn to_record(item: &Value) -> Option<ResultRecord> {
        let content = str_field(item, "content");
        if content.is_empty() {
            return None;
        }
        let mut record = ResultRecord::new()
            .with("title", str_field(item, "title"))
            .with("content", content)
            .with("description", str_field(item, "description"))
            .with("duration", str_field(item, "duration"))
            .with("publisher", str_field(item, "publisher"))
            .with("uploader", str_field(item, "uploader"))
            .with("published", str_field(item, "published"));
        let embed_url = str_field(item, "embed_url");
        if !embed_url.is_empty() {
            record.insert("embed_url", embed_url);
        }
        if let Some(images) = item.get("images") {
            record.insert("images", images.clone());
        }
        Some(record)
    }
}

#[async_trait]
impl Backend for DuckDuckGoVideos {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let vqd = fetch_vqd(&self.client, &self.base_url, &params.query).await?;
        let publish = params
            .timelimit
            .map(|t| format!("publishedAfter:{}", t.code()))
            .unwrap_or_default();
        let resolution = params.extra.get("resolution").cloned().unwrap_or_default();
        let duration = params.extra.get("duration").cloned().unwrap_or_default();

        let query = [
            ("l", params.region.clone()),
            ("o", "json".to_string()),
            ("q", params.query.clone()),
            ("vqd", vqd),
            (
                "f",
                format!("{publish},videoDefinition:{resolution},videoDuration:{duration}"),
            ),
            ("p", safesearch_param(params.safesearch).to_string()),
            ("s", ((params.page.max(1) - 1) * 60).to_string()),
        ];

        let response = self
            .client
            .get(&format!("{}/v.js", self.base_url), &query)
            .await?
            .error_for_status()?;

        Ok(json_results(&response.text)?
            .iter()
            .filter_map(Self::to_record)
            .collect())
    }
}
