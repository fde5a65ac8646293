use crate::format::JsonEventFormatter;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;

/// Path of the event endpoint relative to the collector base URL.
pub const EVENT_ENDPOINT: &str = "/services/collector/event";

/// Configuration for [`HecSink`].
///
/// The sink posts each record, rendered by its [`JsonEventFormatter`], to
/// an HTTP event collector.
#[derive(Clone, Debug)]
pub struct HecConfig {
    /// Base URL without path, e.g. "https://collector.example.com:8088"
    pub url: String,
    /// Collector token, sent as `Authorization: Splunk <token>`.
    pub token: String,
    pub formatter: JsonEventFormatter,
}

/// HTTP event collector implementation of [`LogSink`].
#[derive(Clone)]
pub struct HecSink {
    client: Client,
    config: HecConfig,
}

impl HecSink {
    /// Construct a new sink instance using the provided configuration.
    pub fn new(config: HecConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), EVENT_ENDPOINT)
    }
}

#[async_trait]
impl LogSink for HecSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let body = self.config.formatter.render(record);
        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Splunk {}", self.config.token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("event collector rejected record with status {}: {}", status, text).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let sink = HecSink::new(HecConfig {
            url: "https://collector.local:8088/".to_string(),
            token: "t".to_string(),
            formatter: JsonEventFormatter::default(),
        });
        assert_eq!(sink.endpoint(), "https://collector.local:8088/services/collector/event");
    }
}
