//! YouTube video search (no API key required)

use super::traits::*;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::network::HttpClient;
use crate::results::ResultRecord;
use async_trait::async_trait;
use serde_json::Value;

/// YouTube video search scraped from `ytInitialData`
pub struct YouTube {
    client: HttpClient,
    base_url: String,
}

/// Flatten YouTube's `runs` / `simpleText` text objects
fn json_text(element: Option<&Value>) -> String {
    let Some(element) = element else {
        return String::new();
    };
    if let Some(runs) = element.get("runs").and_then(Value::as_array) {
        return runs
            .iter()
            .filter_map(|r| r.get("text").and_then(Value::as_str))
            .collect();
    }
    element
        .get("simpleText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl YouTube {
    pub const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
        name: "youtube",
        provider: "youtube",
        priority: 1,
        category: Category::Videos,
    };

    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            base_url: "https://www.youtube.com/results".to_string(),
        })
    }

    /// Pull the `ytInitialData` JSON blob out of the results page
    fn extract_initial_data(html: &str) -> Option<Value> {
        let marker = "ytInitialData = ";
        let start = html.find(marker)? + marker.len();
        let end = html[start..].find(";</script>")?;
        serde_json::from_str(&html[start..start + end]).ok()
    }

    fn parse_results(data: &Value) -> Vec<ResultRecord> {
        let sections = data
            .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
            .and_then(Value::as_array);

        let Some(sections) = sections else {
            return Vec::new();
        };

        sections
            .iter()
            .filter_map(|section| section.pointer("/itemSectionRenderer/contents")?.as_array())
            .flatten()
            .filter_map(|item| item.get("videoRenderer"))
            .filter_map(|video| {
                let id = video.get("videoId")?.as_str()?;
                let title = json_text(video.get("title"));
                if title.is_empty() {
                    return None;
                }

                let mut record = ResultRecord::new()
                    .with("title", title)
                    .with("content", format!("https://www.youtube.com/watch?v={id}"))
                    .with("description", json_text(video.get("descriptionSnippet")))
                    .with("duration", json_text(video.get("lengthText")))
                    .with("embed_html", format!(
                        "<iframe width=\"1280\" height=\"720\" src=\"https://www.youtube.com/embed/{id}?autoplay=1\" frameborder=\"0\" allowfullscreen></iframe>"
                    ))
                    .with("embed_url", format!("https://www.youtube.com/embed/{id}"))
                    .with("image_token", "")
                    .with("publisher", "YouTube")
                    .with("uploader", json_text(video.get("ownerText")))
                    .with("published", json_text(video.get("publishedTimeText")));

                record.insert(
                    "images",
                    serde_json::json!({
                        "large": format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
                        "medium": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
                        "small": format!("https://i.ytimg.com/vi/{id}/default.jpg"),
                    }),
                );

                let views: String = json_text(video.get("viewCountText"))
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                if let Ok(views) = views.parse::<u64>() {
                    record.insert("statistics", serde_json::json!({ "viewCount": views }));
                }

                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Backend for YouTube {
    fn descriptor(&self) -> &BackendDescriptor {
        &Self::DESCRIPTOR
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        let mut query = vec![
            ("search_query", params.query.clone()),
            ("hl", params.language().to_string()),
            ("gl", params.country().to_uppercase()),
        ];

        if let Some(limit) = params.timelimit {
            let sp = match limit {
                TimeLimit::Day => "EgIIAg==",
                TimeLimit::Week => "EgIIAw==",
                TimeLimit::Month => "EgIIBA==",
                TimeLimit::Year => "EgIIBQ==",
            };
            query.push(("sp", sp.to_string()));
        }

        let response = self
            .client
            .get_with_headers(&self.base_url, &query, &[("Cookie", "CONSENT=YES+")])
            .await?
            .error_for_status()?;

        match Self::extract_initial_data(&response.text) {
            Some(data) => Ok(Self::parse_results(&data)),
            None => {
                tracing::warn!("could not extract ytInitialData from YouTube response");
                Ok(Vec::new())
            }
        }
    }
}
