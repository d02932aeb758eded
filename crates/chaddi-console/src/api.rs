//! Blocking REST client for the chaddi server.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ConsoleError, Result};
use crate::models::{
    Activity, GroupsPage, Health, MessagesPage, Metrics, Quote, QuoteEnvelope, VersionInfo,
};

/// The endpoints the console consumes. Implemented over HTTP by [`HttpApi`];
/// tests substitute in-memory fakes.
pub trait ConsoleApi: Send + Sync {
    fn metrics(&self) -> Result<Metrics>;
    fn activity(&self) -> Result<Activity>;
    fn random_quote(&self) -> Result<Option<Quote>>;
    fn version(&self) -> Result<VersionInfo>;
    fn health(&self) -> Result<Health>;
    fn groups(&self, page_number: u32) -> Result<GroupsPage>;
    fn group_messages(&self, group_id: &str, page_number: u32) -> Result<MessagesPage>;
    fn update_rokda(&self, bakchod_id: &str, rokda: &str) -> Result<String>;
    fn update_metadata(&self, bakchod_id: &str, metadata: &str) -> Result<String>;
    fn send_message(&self, chat_id: &str, text: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpApi {
    /// Every request is bounded by `timeout`, so a stalled server surfaces as
    /// an error instead of a list stuck in the loading state.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let mut response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ConsoleError::http(path, e))?;
        response
            .body_mut()
            .read_json()
            .map_err(|e| ConsoleError::http(path, e))
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.url(path);
        debug!(%url, "POST");
        let mut response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|e| ConsoleError::http(path, e))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| ConsoleError::http(path, e))
    }
}

/// Path segment escaping for ids; Telegram group ids are `-100…` numbers but
/// nothing stops a caller from passing arbitrary text.
fn path_segment(raw: &str) -> String {
    let mut scratch = url::Url::parse("http://segment/").expect("static URL parses");
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(raw);
    }
    scratch.path().trim_start_matches('/').to_string()
}

impl ConsoleApi for HttpApi {
    fn metrics(&self) -> Result<Metrics> {
        self.get_json("/api/dashboard/metrics")
    }

    fn activity(&self) -> Result<Activity> {
        self.get_json("/api/dashboard/activity")
    }

    fn random_quote(&self) -> Result<Option<Quote>> {
        let envelope: QuoteEnvelope = self.get_json("/api/dashboard/random-quote")?;
        Ok(envelope.quote)
    }

    fn version(&self) -> Result<VersionInfo> {
        self.get_json("/api/dashboard/version")
    }

    fn health(&self) -> Result<Health> {
        self.get_json("/api/health")
    }

    fn groups(&self, page_number: u32) -> Result<GroupsPage> {
        self.get_json(&format!("/api/groups?page_number={}", page_number))
    }

    fn group_messages(&self, group_id: &str, page_number: u32) -> Result<MessagesPage> {
        self.get_json(&format!(
            "/api/groups/{}/messages?page_number={}",
            path_segment(group_id),
            page_number
        ))
    }

    fn update_rokda(&self, bakchod_id: &str, rokda: &str) -> Result<String> {
        self.post_json(
            "/api/bakchod/rokda",
            &json!({ "bakchod_id": bakchod_id, "rokda": rokda }),
        )
    }

    fn update_metadata(&self, bakchod_id: &str, metadata: &str) -> Result<String> {
        self.post_json(
            "/api/bakchod/metadata",
            &json!({ "bakchod_id": bakchod_id, "metadata": metadata }),
        )
    }

    fn send_message(&self, chat_id: &str, text: &str) -> Result<String> {
        self.post_json(
            "/api/bot/send_msg",
            &json!({ "chat_id": chat_id, "message_text": text }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpApi::new("http://127.0.0.1:5000/", Duration::from_secs(1));
        assert_eq!(api.base_url(), "http://127.0.0.1:5000");
        assert_eq!(api.url("/api/health"), "http://127.0.0.1:5000/api/health");
    }

    #[test]
    fn test_path_segment_escapes() {
        assert_eq!(path_segment("-1001234"), "-1001234");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(path_segment("x?y#z"), "x%3Fy%23z");
    }
}
