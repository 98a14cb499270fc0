//! Message segments.
//!
//! A chat message is a sequence of segments: runs of text interleaved with
//! mentions, a quoted reply, or images.

use crate::id::{MessageId, UserId};
use serde::{Deserialize, Serialize};

/// One piece of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A mention of another user.
    At {
        /// The mentioned user.
        user_id: UserId,
    },
    /// A quote of an earlier message. Platforms place it first.
    Reply {
        /// The quoted message.
        message_id: MessageId,
    },
    /// An attached image.
    Image {
        /// Where the platform can fetch the image from.
        url: String,
    },
}

impl Segment {
    /// Construct a text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    /// Construct a mention segment.
    pub fn at(user_id: UserId) -> Self {
        Segment::At { user_id }
    }
}

/// Concatenate all text segments and trim surrounding whitespace.
pub fn plain_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if let Segment::Text { text } = segment {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}
