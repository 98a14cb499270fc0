//! # warden-proto
//!
//! The vocabulary groupwarden speaks with a messaging platform: identifiers,
//! message segments, inbound events and member records.
//!
//! Nothing in this crate performs I/O. Every type derives `serde` traits so
//! a gateway can decode platform payloads straight into them.
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_proto::{Event, Segment};
//!
//! let raw = r#"{"type":"group_message","group_id":100,"message_id":7,
//!     "sender":{"user_id":1,"nickname":"alice","role":"owner"},
//!     "segments":[{"type":"text","text":"/kick "},{"type":"at","user_id":2}]}"#;
//! let event: Event = serde_json::from_str(raw).unwrap();
//!
//! if let Event::GroupMessage(msg) = event {
//!     assert_eq!(msg.plain_text(), "/kick");
//!     assert_eq!(msg.mentions().count(), 1);
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod event;
pub mod id;
pub mod member;
pub mod segment;

pub use event::{Event, GroupMessage, JoinRequest, LeaveKind, MemberLeave, Sender};
pub use id::{GroupId, MessageId, UserId};
pub use member::{GroupNotice, MemberInfo, MemberRole, StoredMessage, StrangerInfo};
pub use segment::{Segment, plain_text};
