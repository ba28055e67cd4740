use chrono::{DateTime, Duration, Utc};
use locofest_types::models::{BlockRecord, Role};
use thiserror::Error;

pub const DEFAULT_BLOCK_MINUTES: u32 = 10;

/// The caller of a block request. `role` is `None` when the caller has no
/// profile document.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockRequest {
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    pub minutes: Option<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("only boss accounts can block users")]
    Forbidden,
    #[error("missing arguments: userId and cityId are required")]
    MissingArguments,
}

/// A request that passed authorization and validation. The target's role is
/// still unknown at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTarget {
    pub user_id: String,
    /// Lowercased.
    pub channel_id: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Issued(BlockRecord),
    Refused { reason: String },
}

impl Actor {
    /// The identity and role half of validation. Usable before the request
    /// body has been decoded.
    pub fn authorize(actor: Option<&Actor>) -> Result<&Actor, BlockError> {
        let actor = actor.ok_or(BlockError::Unauthenticated)?;
        if !actor.role.is_some_and(Role::is_elevated) {
            return Err(BlockError::Forbidden);
        }
        Ok(actor)
    }
}

impl BlockRequest {
    /// Checks run in order: identity, caller role, arguments.
    pub fn validate(self, actor: Option<&Actor>) -> Result<BlockTarget, BlockError> {
        Actor::authorize(actor)?;

        let user_id = self.user_id.filter(|s| !s.is_empty());
        let channel_id = self.channel_id.filter(|s| !s.is_empty());
        let (Some(user_id), Some(channel_id)) = (user_id, channel_id) else {
            return Err(BlockError::MissingArguments);
        };

        Ok(BlockTarget {
            user_id,
            channel_id: channel_id.to_lowercase(),
            minutes: self.minutes.filter(|m| *m > 0).unwrap_or(DEFAULT_BLOCK_MINUTES),
        })
    }
}

impl BlockTarget {
    /// Moderators are immune; everyone else is blocked until `now + minutes`.
    pub fn issue(self, target_role: Option<Role>, now: DateTime<Utc>) -> BlockOutcome {
        if target_role.is_some_and(Role::is_elevated) {
            return BlockOutcome::Refused {
                reason: "cannot block a boss".to_string(),
            };
        }
        BlockOutcome::Issued(BlockRecord {
            user_id: self.user_id,
            channel_id: self.channel_id,
            blocked_until: now + Duration::minutes(i64::from(self.minutes)),
        })
    }
}
