use async_trait::async_trait;
use reqwest::Client;

use crate::error::HubError;
use crate::quote::{base_code, Quote};

/// Upstream quote source. One call per poll cycle carries the whole batch,
/// so the fetch volume is independent of how many consumers watch a symbol.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch_quotes(&self, symbol_ids: &[String]) -> Result<Vec<Quote>, HubError>;
}

/// HTTP implementation hitting the quote server's batched endpoint.
///
/// The server is keyed by base symbol codes, so any market suffix is
/// stripped before the request ("2330.TW" -> "2330").
pub struct HttpQuoteFetcher {
    client: Client,
    base_url: String,
}

impl HttpQuoteFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn quotes_url(&self, symbol_ids: &[String]) -> String {
        let base_ids: Vec<&str> = symbol_ids.iter().map(|s| base_code(s)).collect();
        format!("{}/api/rtquote?id={}", self.base_url, base_ids.join(","))
    }
}

#[async_trait]
impl QuoteFetcher for HttpQuoteFetcher {
    async fn fetch_quotes(&self, symbol_ids: &[String]) -> Result<Vec<Quote>, HubError> {
        let url = self.quotes_url(symbol_ids);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(HubError::UpstreamFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let quotes: Vec<Quote> = response.json().await?;
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_url_strips_market_suffix() {
        let fetcher = HttpQuoteFetcher::new("http://localhost:8080/xtmrnserver/");
        let symbols = vec!["2330.TW".to_string(), "1101.TW".to_string()];
        assert_eq!(
            fetcher.quotes_url(&symbols),
            "http://localhost:8080/xtmrnserver/api/rtquote?id=2330,1101"
        );
    }
}
