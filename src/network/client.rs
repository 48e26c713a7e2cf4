//! HTTP client for making requests to search providers

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::{BackendConfig, TlsVerify};
use crate::error::BackendError;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Response returned to backends
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, BackendError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates CAPTCHA
    pub fn is_captcha(&self) -> bool {
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("automated requests")
    }

    /// Fail on rate limiting and non-2xx statuses
    pub fn error_for_status(self) -> Result<Self, BackendError> {
        if self.status == 429 {
            Err(BackendError::Ratelimit(format!("{} returned 429", self.url)))
        } else if self.is_success() {
            Ok(self)
        } else {
            Err(BackendError::Status(self.status))
        }
    }
}

/// HTTP client wrapper configured from the session's backend configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, BackendError> {
        Self::with_config(&BackendConfig::default())
    }

    /// Create a new HTTP client from the proxy, timeout and TLS policy
    pub fn with_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        match &config.verify {
            TlsVerify::Enabled(false) => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsVerify::Enabled(true) => {}
            TlsVerify::Bundle(_) => {
                if let Some(pem) = config.load_bundle()? {
                    let cert = reqwest::Certificate::from_pem(&pem)
                        .map_err(|e| BackendError::Build(e.to_string()))?;
                    builder = builder.add_root_certificate(cert);
                }
            }
        }

        if let Some(ref proxy_url) = config.proxy {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| BackendError::Build(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| BackendError::Build(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
            user_agent: generate_user_agent(),
        })
    }

    /// GET request with query parameters
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, BackendError> {
        self.get_with_headers(url, params, &[]).await
    }

    /// GET request with extra headers (cookies, referers)
    pub async fn get_with_headers(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, BackendError> {
        let mut request = self.client.get(url).query(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(request).await
    }

    /// POST request with form data
    pub async fn post_form(
        &self,
        url: &str,
        data: &[(&str, String)],
    ) -> Result<HttpResponse, BackendError> {
        let request = self.client.post(url).form(data);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<HttpResponse, BackendError> {
        let request = request
            .timeout(self.timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language("us-en"))
            .header("DNT", "1");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(e.to_string())
            } else {
                BackendError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;

        Ok(HttpResponse { status, text, url })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_proxy_is_build_error() {
        let config = BackendConfig {
            proxy: Some("not a proxy url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::with_config(&config),
            Err(BackendError::Build(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .get(&format!("{}/search", server.uri()), &[("q", "rust".to_string())])
            .await
            .unwrap();

        assert_eq!(response.status, 429);
        assert!(matches!(
            response.error_for_status(),
            Err(BackendError::Ratelimit(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        let response = |status| HttpResponse {
            status,
            text: String::new(),
            url: "https://example.com/".into(),
        };

        assert!(response(204).is_success());
        assert!(response(204).error_for_status().is_ok());
        assert!(!response(503).is_success());
        assert!(matches!(
            response(503).error_for_status(),
            Err(BackendError::Status(503))
        ));
    }
}
