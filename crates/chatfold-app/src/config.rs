//! Facade configuration.
//!
//! [`ChatConfig`] carries everything the facade needs to know about the local
//! account and presentation policy. Every field has a default so a config
//! file only has to name what differs.

use std::time::Duration;

use chatfold_core::UserId;
use serde::Deserialize;

/// Default unread settle window after session start.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Default minimum number of loaded events before selection triggers a
/// backfill.
pub const DEFAULT_MIN_WINDOW: usize = 200;

/// Default page size for backfill requests.
pub const DEFAULT_BACKFILL_LIMIT: usize = 200;

/// Configuration for a [`crate::ChatFacade`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    /// Identity of the local account.
    pub local_user: UserId,

    /// Identities that represent the local user on bridged networks.
    /// Their messages never count as unread.
    pub linked_identities: Vec<UserId>,

    /// Rooms containing any of these members sort ahead of all others.
    pub priority_identities: Vec<UserId>,

    /// Unread counting starts this many milliseconds after session start.
    pub settle_delay_ms: u64,

    /// Selecting a room with fewer loaded events than this requests older
    /// history.
    pub min_window: usize,

    /// Events requested per backfill page.
    pub backfill_limit: usize,

    /// Display names of rooms never shown in the room list.
    pub hidden_rooms: Vec<String>,

    /// Select the first listed room once the initial room list arrives.
    pub auto_select_first: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            local_user: UserId::new(""),
            linked_identities: Vec::new(),
            priority_identities: Vec::new(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            min_window: DEFAULT_MIN_WINDOW,
            backfill_limit: DEFAULT_BACKFILL_LIMIT,
            hidden_rooms: vec!["WhatsApp bridge bot".to_owned()],
            auto_select_first: true,
        }
    }
}

impl ChatConfig {
    /// Config for `local_user` with every other field defaulted.
    pub fn for_user(local_user: impl Into<UserId>) -> Self {
        Self { local_user: local_user.into(), ..Self::default() }
    }

    /// Settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// True if a room with this display name is hidden from the room list.
    pub fn is_hidden(&self, display_name: &str) -> bool {
        self.hidden_rooms.iter().any(|hidden| hidden == display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.settle_delay(), Duration::from_secs(5));
        assert_eq!(config.min_window, 200);
        assert!(config.auto_select_first);
        assert!(config.is_hidden("WhatsApp bridge bot"));
        assert!(!config.is_hidden("Family"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ChatConfig = serde_json::from_str(
            r#"{"local_user": "@me:example.org", "priority_identities": ["@boss:example.org"]}"#,
        )
        .unwrap();

        assert_eq!(config.local_user, UserId::new("@me:example.org"));
        assert_eq!(config.priority_identities, [UserId::new("@boss:example.org")]);
        assert_eq!(config.backfill_limit, DEFAULT_BACKFILL_LIMIT);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ChatConfig, _> = serde_json::from_str(r#"{"settle_delay": 5}"#);
        assert!(result.is_err());
    }
}
