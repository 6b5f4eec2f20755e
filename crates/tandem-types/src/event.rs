//! Transport event envelopes.
//!
//! Inbound events arrive from the chat transport as text, a photo reference,
//! or a structured button press; outbound messages carry text, an optional
//! parse mode, and an optional semantic keyboard the transport adapter
//! renders into its own markup.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// A structured button-press tag, encoded on the wire as callback data
/// (`accept_chat_7`, `reject_chat_7`, `create_booking_yes_7`,
/// `create_booking_no`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ButtonTag {
    /// Provider accepts the chat request with this chat id.
    AcceptChat(i64),
    /// Provider rejects the chat request with this chat id.
    RejectChat(i64),
    /// Provider accepts the post-chat booking offer for this chat id.
    BookingOfferAccepted(i64),
    /// Provider declines the post-chat booking offer.
    BookingOfferDeclined,
}

impl fmt::Display for ButtonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonTag::AcceptChat(id) => write!(f, "accept_chat_{id}"),
            ButtonTag::RejectChat(id) => write!(f, "reject_chat_{id}"),
            ButtonTag::BookingOfferAccepted(id) => write!(f, "create_booking_yes_{id}"),
            ButtonTag::BookingOfferDeclined => write!(f, "create_booking_no"),
        }
    }
}

impl FromStr for ButtonTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_id = |suffix: &str| {
            suffix
                .parse::<i64>()
                .map_err(|_| format!("invalid button data: '{s}'"))
        };
        if let Some(id) = s.strip_prefix("accept_chat_") {
            return Ok(ButtonTag::AcceptChat(parse_id(id)?));
        }
        if let Some(id) = s.strip_prefix("reject_chat_") {
            return Ok(ButtonTag::RejectChat(parse_id(id)?));
        }
        if let Some(id) = s.strip_prefix("create_booking_yes_") {
            return Ok(ButtonTag::BookingOfferAccepted(parse_id(id)?));
        }
        if s == "create_booking_no" {
            return Ok(ButtonTag::BookingOfferDeclined);
        }
        Err(format!("invalid button data: '{s}'"))
    }
}

impl From<ButtonTag> for String {
    fn from(tag: ButtonTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for ButtonTag {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Content of an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Text { text: String },
    Photo { file_id: String, caption: Option<String> },
    Button { data: ButtonTag },
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }

    pub fn button(data: ButtonTag) -> Self {
        Event::Button { data }
    }
}

/// Envelope for one inbound event as delivered by the transport webhook.
///
/// The id is a time-sortable UUID used only for log correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,
    pub user_id: i64,
    #[serde(flatten)]
    pub event: Event,
}

/// Outbound text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    Html,
}

/// An inline button: label plus the structured tag echoed back on press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub data: ButtonTag,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: ButtonTag) -> Self {
        Self { label: label.into(), data }
    }
}

/// Semantic keyboard attached to an outbound message.
///
/// The core only names which keyboard a message carries; the transport
/// adapter owns the concrete markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Keyboard {
    ClientMenu,
    ProviderMenu,
    /// Active-chat keyboard (the "End chat" button).
    ChatActive,
    /// Single cancel button shown during data-entry steps.
    CancelOnly,
    /// Explicit role selection with unread counts per role.
    RoleSelect { client_count: u64, provider_count: u64 },
    Inline { buttons: Vec<InlineButton> },
}

/// One message to deliver to a user.
///
/// When `photo_file_id` is set the text acts as the caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    /// Plain text, no keyboard.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo_file_id: None,
            parse_mode: None,
            keyboard: None,
        }
    }

    /// HTML-formatted text, no keyboard.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo_file_id: None,
            parse_mode: Some(ParseMode::Html),
            keyboard: None,
        }
    }

    /// A photo by transport file id, with `caption` as the text.
    pub fn photo(file_id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            text: caption.into(),
            photo_file_id: Some(file_id.into()),
            parse_mode: None,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Drop the parse mode and strip angle brackets; the fallback for
    /// transports that reject the markup.
    pub fn stripped(&self) -> Self {
        Self {
            text: self.text.replace(['<', '>'], ""),
            photo_file_id: self.photo_file_id.clone(),
            parse_mode: None,
            keyboard: self.keyboard.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_tag_roundtrip() {
        for tag in [
            ButtonTag::AcceptChat(7),
            ButtonTag::RejectChat(7),
            ButtonTag::BookingOfferAccepted(12),
            ButtonTag::BookingOfferDeclined,
        ] {
            let parsed: ButtonTag = tag.to_string().parse().unwrap();
            assert_eq!(tag, parsed);
        }
    }

    #[test]
    fn test_button_tag_rejects_garbage() {
        assert!("accept_chat_".parse::<ButtonTag>().is_err());
        assert!("accept_chat_x".parse::<ButtonTag>().is_err());
        assert!("unknown".parse::<ButtonTag>().is_err());
    }

    #[test]
    fn test_button_tag_serde_as_string() {
        let json = serde_json::to_string(&ButtonTag::AcceptChat(7)).unwrap();
        assert_eq!(json, "\"accept_chat_7\"");
        let back: ButtonTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ButtonTag::AcceptChat(7));
    }

    #[test]
    fn test_inbound_event_deserializes_flattened() {
        let json = r#"{"user_id": 42, "type": "text", "text": "hello"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.user_id, 42);
        assert_eq!(event.event, Event::text("hello"));
    }

    #[test]
    fn test_inbound_button_event() {
        let json = r#"{"user_id": 42, "type": "button", "data": "reject_chat_3"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event, Event::button(ButtonTag::RejectChat(3)));
    }

    #[test]
    fn test_stripped_removes_markup() {
        let msg = OutboundMessage::html("<b>bold</b> & plain");
        let stripped = msg.stripped();
        assert_eq!(stripped.text, "bbold/b & plain");
        assert!(stripped.parse_mode.is_none());
    }
}
