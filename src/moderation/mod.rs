//! Autonomous moderation policies.
//!
//! - [`ForbiddenWordFilter`] screens messages in configured groups.
//! - [`JoinRequestEngine`] screens join requests and resolves escalations.
//! - [`notification`] renders and parses the escalation notice.

mod forbidden;
mod join;
mod notification;

pub use forbidden::ForbiddenWordFilter;
pub use join::JoinRequestEngine;
