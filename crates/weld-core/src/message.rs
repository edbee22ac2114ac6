//! Message content as an immutable sequence of typed segments.
//!
//! A message is not a flat string: it mixes plain text with inline entities
//! such as mentions and emoticon icons. [`MessageContent`] models that as an
//! ordered list of [`Segment`]s, assembled through [`MessageBuilder`] and
//! frozen by the terminal [`MessageBuilder::build`] step. Once built, content
//! is never mutated — handlers and transports share it freely.
//!
//! # Example
//!
//! ```rust,ignore
//! use weld_core::{AccountId, MessageBuilder};
//!
//! let msg = MessageBuilder::new()
//!     .mention(AccountId::new(10001000))
//!     .text(" Welcome aboard!")
//!     .icon(178)
//!     .build();
//!
//! assert_eq!(msg.plain_text(), " Welcome aboard!");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

// ============================================================================
// Segment
// ============================================================================

/// One unit of message content.
///
/// Serializes in the tagged-object wire shape used by QQ-style transports:
/// `{"type": "text", "data": {"text": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text.
    Text(TextData),
    /// @mention of a specific account.
    Mention(MentionData),
    /// @mention of every group member.
    MentionAll(MentionAllData),
    /// Emoticon icon, addressed by the network's icon id table.
    Icon(IconData),
}

/// Plain text segment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    /// The text content.
    pub text: String,
}

/// Mention segment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionData {
    /// The mentioned account.
    pub account: AccountId,
}

/// Mention-all segment data (empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionAllData {}

/// Icon segment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconData {
    /// Icon id.
    pub id: u32,
}

impl Segment {
    /// Creates a text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(TextData { text: text.into() })
    }

    /// Creates a mention segment.
    pub fn mention(account: AccountId) -> Self {
        Segment::Mention(MentionData { account })
    }

    /// Creates a mention-all segment.
    pub fn mention_all() -> Self {
        Segment::MentionAll(MentionAllData {})
    }

    /// Creates an icon segment.
    pub fn icon(id: u32) -> Self {
        Segment::Icon(IconData { id })
    }

    /// Returns the type identifier of this segment.
    pub fn segment_type(&self) -> &'static str {
        match self {
            Segment::Text(_) => "text",
            Segment::Mention(_) => "mention",
            Segment::MentionAll(_) => "mention_all",
            Segment::Icon(_) => "icon",
        }
    }

    /// Returns the text content if this is a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(data) => Some(&data.text),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(data) => f.write_str(&data.text),
            Segment::Mention(data) => write!(f, "@{}", data.account),
            Segment::MentionAll(_) => f.write_str("@all"),
            Segment::Icon(data) => write!(f, "[icon:{}]", data.id),
        }
    }
}

// ============================================================================
// MessageContent
// ============================================================================

/// An immutable message: an ordered sequence of segments.
///
/// Produced by [`MessageBuilder::build`]; offers read access only. Serializes
/// as a bare JSON array of segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent {
    segments: Vec<Segment>,
}

impl MessageContent {
    /// Creates content holding a single text segment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
        }
    }

    /// Returns an iterator over the segments.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Returns the segments as a slice.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the message has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenates the content of all text segments.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(Segment::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Returns all accounts mentioned individually.
    pub fn mentions(&self) -> Vec<AccountId> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Mention(data) => Some(data.account),
                _ => None,
            })
            .collect()
    }

    /// Whether the message mentions everyone.
    pub fn mentions_all(&self) -> bool {
        self.segments
            .iter()
            .any(|seg| matches!(seg, Segment::MentionAll(_)))
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl<'a> IntoIterator for &'a MessageContent {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

// ============================================================================
// MessageBuilder
// ============================================================================

/// Fluent builder for [`MessageContent`].
///
/// Appenders take and return the builder by value; [`build`](Self::build) is
/// the terminal step producing the immutable content.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    segments: Vec<Segment>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text segment.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::text(text));
        self
    }

    /// Appends a mention of a specific account.
    pub fn mention(mut self, account: AccountId) -> Self {
        self.segments.push(Segment::mention(account));
        self
    }

    /// Appends a mention of everyone.
    pub fn mention_all(mut self) -> Self {
        self.segments.push(Segment::mention_all());
        self
    }

    /// Appends an icon.
    pub fn icon(mut self, id: u32) -> Self {
        self.segments.push(Segment::icon(id));
        self
    }

    /// Appends a pre-built segment.
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Finalizes the builder into immutable content.
    pub fn build(self) -> MessageContent {
        MessageContent {
            segments: self.segments,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_order_and_plain_text() {
        let msg = MessageBuilder::new()
            .mention(AccountId::new(10001000))
            .text(" Welcome!")
            .text(" Glad to have you.")
            .icon(178)
            .build();

        assert_eq!(msg.len(), 4);
        assert_eq!(msg.plain_text(), " Welcome! Glad to have you.");
        assert_eq!(msg.mentions(), vec![AccountId::new(10001000)]);
        assert!(!msg.mentions_all());
    }

    #[test]
    fn test_display_rendering() {
        let msg = MessageBuilder::new()
            .mention(AccountId::new(42))
            .text(" hi ")
            .icon(9)
            .build();
        assert_eq!(msg.to_string(), "@42 hi [icon:9]");
    }

    #[test]
    fn test_segment_serialize_shape() {
        let text = Segment::text("Hello");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"{"type":"text","data":{"text":"Hello"}}"#);

        let mention = Segment::mention(AccountId::new(10001000));
        let json = serde_json::to_string(&mention).unwrap();
        assert_eq!(json, r#"{"type":"mention","data":{"account":10001000}}"#);

        let icon = Segment::icon(178);
        let json = serde_json::to_string(&icon).unwrap();
        assert_eq!(json, r#"{"type":"icon","data":{"id":178}}"#);
    }

    #[test]
    fn test_content_serializes_as_array() {
        let msg = MessageBuilder::new().text("Hi").icon(9).build();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"text","data":{"text":"Hi"}},{"type":"icon","data":{"id":9}}]"#
        );

        let back: MessageContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_from_text() {
        let msg: MessageContent = "Hello".into();
        assert_eq!(msg.len(), 1);
        assert_eq!(msg.plain_text(), "Hello");
        assert!(MessageContent::default().is_empty());
    }

    #[test]
    fn test_mention_all() {
        let msg = MessageBuilder::new().mention_all().text(" meeting at 8").build();
        assert!(msg.mentions_all());
        assert!(msg.mentions().is_empty());
    }
}
