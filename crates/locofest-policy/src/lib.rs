//! Locofest retention & moderation policy
//!
//! Pure decision functions. Nothing in this crate touches the store or the
//! clock: callers pass in `now` and whatever snapshot of the data the rule
//! needs, and act on the verdict themselves.

pub mod accounts;
pub mod block;
pub mod chat_window;
pub mod moderation;
pub mod retention;

pub use block::{Actor, BlockError, BlockOutcome, BlockRequest, BlockTarget};
pub use moderation::{ModerationPolicy, ModerationVerdict};
pub use retention::{RetentionPolicy, RoleSnapshot};
