//! Permission resolution and the authorization gate.
//!
//! - [`TrustLevel`] is the ordinal privilege scale (`SuperUser` .. `Unknown`).
//! - [`PermissionResolver`] turns an actor id into a level for a group.
//! - [`AuthorizationGate`] checks actor, bot and targets against a
//!   [`PermissionRequirement`] before any side effect happens.

mod gate;
mod level;
mod resolver;

pub use gate::{AccessRequest, AuthorizationGate, Denial};
pub use level::{PermissionRequirement, TrustLevel};
pub use resolver::PermissionResolver;
