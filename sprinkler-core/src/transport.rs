use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

use crate::error::{Result, WeatherError};

/// "Fetch text over HTTP by URL". One attempt, no retries.
#[async_trait]
pub trait TextFetcher: Send + Sync + Debug {
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.without_url().to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::UpstreamUnavailable(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Canned responses keyed by a URL substring; records every URL requested.
    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        routes: Vec<(String, Result<String>)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, url_contains: &str, body: &str) -> Self {
            self.routes.push((url_contains.to_string(), Ok(body.to_string())));
            self
        }

        pub fn fail(mut self, url_contains: &str) -> Self {
            self.routes.push((
                url_contains.to_string(),
                Err(WeatherError::UpstreamUnavailable("connection refused".into())),
            ));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextFetcher for FakeFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.routes
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()))
                .map(|(_, res)| res.clone())
                .unwrap_or_else(|| {
                    Err(WeatherError::UpstreamUnavailable(format!(
                        "no route for {url}"
                    )))
                })
        }
    }
}
