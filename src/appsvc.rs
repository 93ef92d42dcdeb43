use reqwest::Client;

use crate::error::HubError;

/// Client for the host application's auxiliary endpoints: opaque text blobs
/// by identifier and broker-extensible service calls. Used by the screens
/// around the quote engine, never by the engine itself.
///
/// Only text-based payloads (JSON, XML, ...) are supported by the file
/// endpoint.
pub struct AppService {
    client: Client,
    base_url: String,
}

impl AppService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a file's content as text by its identifier.
    pub async fn get_file(&self, file_id: &str) -> Result<String, HubError> {
        let url = self.file_url(file_id);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(HubError::UpstreamFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }

    /// Call a host-side service operation with url-encoded parameters,
    /// returning its JSON response.
    pub async fn call_service(
        &self,
        op: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, HubError> {
        let url = self.service_url(op, params);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(HubError::UpstreamFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.json().await?)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/api/getfile?file={}",
            self.base_url,
            urlencoding::encode(file_id)
        )
    }

    fn service_url(&self, op: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/api/callsvc?op={}", self.base_url, urlencoding::encode(op));
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}
