//! Records served by the chaddi REST API and pushed over the live stream.
//!
//! Every optional field stays optional here; the `*_name` / `*_title`
//! helpers resolve them to the literals the console displays.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_GROUP: &str = "Unknown Group";
pub const DIRECT_MESSAGE: &str = "Direct Message";
pub const NO_TEXT: &str = "(No text)";

/// Telegram ids come back as strings or numbers depending on the column type.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
            RawId::Float(n) if n.fract() == 0.0 => format!("{}", n as i64),
            RawId::Float(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A tracked chat participant, as embedded in messages, quotes and activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BakchodRef {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub tg_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub pretty_name: Option<String>,
    #[serde(default)]
    pub rokda: Option<f64>,
}

impl BakchodRef {
    /// `pretty_name`, then `username`, then "Unknown".
    pub fn display_name(&self) -> &str {
        non_empty(&self.pretty_name)
            .or_else(|| non_empty(&self.username))
            .unwrap_or(UNKNOWN_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(deserialize_with = "id_string")]
    pub group_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl Group {
    pub fn display_name(&self) -> &str {
        non_empty(&self.name).unwrap_or(UNKNOWN_NAME)
    }
}

/// Group reference inside dashboard payloads, where the id may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GroupRef {
    pub fn display_name(&self) -> &str {
        non_empty(&self.name).unwrap_or(UNKNOWN_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "id_string")]
    pub message_id: String,
    #[serde(default)]
    pub time_sent: Option<String>,
    #[serde(default)]
    pub from_bakchod: Option<BakchodRef>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub to_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Raw Telegram update the message was logged from.
    #[serde(default)]
    pub update: Option<Value>,
}

impl Message {
    pub fn author_name(&self) -> &str {
        self.from_bakchod
            .as_ref()
            .map(BakchodRef::display_name)
            .unwrap_or(UNKNOWN_NAME)
    }

    fn update_chat(&self) -> Option<&Value> {
        self.update.as_ref()?.get("message")?.get("chat")
    }

    pub fn chat_title(&self) -> &str {
        self.update_chat()
            .and_then(|chat| chat.get("title"))
            .and_then(Value::as_str)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(DIRECT_MESSAGE)
    }

    /// The chat the message was sent to: `to_id`, else the chat id in the update.
    pub fn chat_id(&self) -> Option<String> {
        if let Some(id) = non_empty(&self.to_id) {
            return Some(id.to_string());
        }
        match self.update_chat()?.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn text_or_placeholder(&self) -> &str {
        non_empty(&self.text).unwrap_or(NO_TEXT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub bakchods_count: Option<i64>,
    #[serde(default)]
    pub groups_count: Option<i64>,
    #[serde(default)]
    pub messages_count: Option<i64>,
    #[serde(default)]
    pub quotes_count: Option<i64>,
    #[serde(default)]
    pub roll_count: Option<i64>,
    #[serde(default)]
    pub jobs_count: Option<i64>,
    #[serde(default)]
    pub recent_bakchods: Option<i64>,
    #[serde(default)]
    pub recent_messages: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub most_active_bakchod: Option<BakchodRef>,
    #[serde(default)]
    pub most_active_group: Option<GroupRef>,
    #[serde(default)]
    pub latest_message_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub quote_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author_bakchod: Option<BakchodRef>,
    #[serde(default)]
    pub quoted_in_group: Option<GroupRef>,
    #[serde(default)]
    pub created: Option<String>,
}

impl Quote {
    pub fn author_name(&self) -> &str {
        self.author_bakchod
            .as_ref()
            .map(BakchodRef::display_name)
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn group_name(&self) -> &str {
        self.quoted_in_group
            .as_ref()
            .and_then(|g| non_empty(&g.name))
            .unwrap_or(UNKNOWN_GROUP)
    }
}

/// Body of `GET /api/dashboard/random-quote`; `quote` is null when there are none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(default)]
    pub quote: Option<Quote>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub semver: Option<String>,
    #[serde(default)]
    pub git_commit_id: Option<String>,
    #[serde(default)]
    pub git_commit_time: Option<String>,
    #[serde(default)]
    pub time_service_started: Option<String>,
    #[serde(default)]
    pub pretty_uptime: Option<String>,
    #[serde(default)]
    pub git_commit_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub health: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupsPage {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub total_groups: Option<u64>,
    #[serde(default)]
    pub total_pages: u32,
}

/// One page of a group's history. The server returns newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesPage {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let group: Group = serde_json::from_value(json!({
            "group_id": -1001234567890i64,
            "name": "bakchod hq"
        }))
        .unwrap();
        assert_eq!(group.group_id, "-1001234567890");

        let group: Group =
            serde_json::from_value(json!({ "group_id": "42", "name": null })).unwrap();
        assert_eq!(group.group_id, "42");
        assert_eq!(group.display_name(), "Unknown");
    }

    #[test]
    fn test_message_fallbacks() {
        let message: Message = serde_json::from_value(json!({ "message_id": 7 })).unwrap();
        assert_eq!(message.author_name(), "Unknown");
        assert_eq!(message.chat_title(), "Direct Message");
        assert_eq!(message.text_or_placeholder(), "(No text)");
        assert_eq!(message.chat_id(), None);
    }

    #[test]
    fn test_message_resolves_nested_fields() {
        let message: Message = serde_json::from_value(json!({
            "message_id": "99",
            "time_sent": "2024-03-01T10:00:00",
            "from_bakchod": { "tg_id": 1, "username": "chutiya", "pretty_name": "" },
            "text": "hi",
            "update": { "message": { "chat": { "id": -55, "title": "Bakchod Group" } } }
        }))
        .unwrap();
        assert_eq!(message.author_name(), "chutiya");
        assert_eq!(message.chat_title(), "Bakchod Group");
        assert_eq!(message.chat_id().as_deref(), Some("-55"));
    }

    #[test]
    fn test_to_id_takes_precedence_over_update_chat() {
        let message: Message = serde_json::from_value(json!({
            "message_id": "1",
            "to_id": "-10",
            "update": { "message": { "chat": { "id": -55 } } }
        }))
        .unwrap();
        assert_eq!(message.chat_id().as_deref(), Some("-10"));
    }

    #[test]
    fn test_quote_fallbacks() {
        let quote = Quote::default();
        assert_eq!(quote.author_name(), "Unknown");
        assert_eq!(quote.group_name(), "Unknown Group");
    }
}
