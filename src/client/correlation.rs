//! Request/reply correlation
//!
//! A receiver answers a command with a message carrying the same 3-char
//! prefix. Two commands are special:
//!
//! - `MGS` (multiroom group setting) is answered with an `MDI` message
//! - `CTV` (TV operation over HDMI-CEC) is never answered, so the sent
//!   message itself counts as the reply
//!
//! ```text
//!            offer(msg) prefix matches
//!   Pending ──────────────────────────► Matched(msg)
//!      │
//!      │ deadline passes
//!      ▼
//!   TimedOut
//! ```
//!
//! Every inbound message is offered to the pending reply before anything
//! else sees it; messages that do not match are handed back to the caller.

use std::time::{Duration, Instant};

use crate::error::EiscpError;
use crate::protocol::prefix_of;

/// Commands whose reply never arrives
pub const FIRE_AND_FORGET: [&str; 1] = ["CTV"];

/// Commands answered under a different prefix
pub const REPLY_ALIASES: [(&str, &str); 1] = [("MGS", "MDI")];

/// State of a request waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyState {
    Pending,
    Matched(String),
    TimedOut,
}

/// Result of offering an inbound message to a pending reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
    /// The message is the reply
    Matched(String),

    /// The message belongs to someone else
    Unrelated(String),
}

/// A sent request and what it is waiting for
#[derive(Debug)]
pub struct PendingReply {
    sent: String,
    prefix: String,
    alternate: Option<&'static str>,
    started: Instant,
    deadline: Instant,
    state: ReplyState,
}

impl PendingReply {
    pub fn new(sent: &str, timeout: Duration) -> Self {
        let started = Instant::now();
        let prefix = prefix_of(sent).to_string();
        let alternate = REPLY_ALIASES
            .iter()
            .find(|(from, _)| *from == prefix)
            .map(|(_, to)| *to);

        let state = if FIRE_AND_FORGET.contains(&prefix.as_str()) {
            ReplyState::Matched(sent.to_string())
        } else {
            ReplyState::Pending
        };

        Self {
            sent: sent.to_string(),
            prefix,
            alternate,
            started,
            deadline: started + timeout,
            state,
        }
    }

    pub fn state(&self) -> &ReplyState {
        &self.state
    }

    pub fn sent(&self) -> &str {
        &self.sent
    }

    /// Does `message` answer this request?
    pub fn accepts(&self, message: &str) -> bool {
        let prefix = prefix_of(message);
        prefix == self.prefix || self.alternate == Some(prefix)
    }

    /// Offer an inbound message
    ///
    /// Once the reply is matched, later messages are always unrelated.
    pub fn offer(&mut self, message: String) -> Offer {
        if self.state == ReplyState::Pending && self.accepts(&message) {
            self.state = ReplyState::Matched(message.clone());
            Offer::Matched(message)
        } else {
            Offer::Unrelated(message)
        }
    }

    /// Time left before the deadline, moving to `TimedOut` once it passes
    pub fn remaining(&mut self) -> Option<Duration> {
        if self.state != ReplyState::Pending {
            return None;
        }
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            self.state = ReplyState::TimedOut;
            None
        } else {
            Some(left)
        }
    }

    /// The reply, if one was matched
    pub fn reply(&self) -> Option<&str> {
        match &self.state {
            ReplyState::Matched(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn timeout_error(&self) -> EiscpError {
        EiscpError::Timeout {
            message: self.sent.clone(),
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn test_prefix_match() {
        let mut pending = PendingReply::new("PWRQSTN", LONG);
        assert_eq!(pending.state(), &ReplyState::Pending);

        assert_eq!(
            pending.offer("MVL2A".to_string()),
            Offer::Unrelated("MVL2A".to_string())
        );
        assert_eq!(
            pending.offer("PWR01".to_string()),
            Offer::Matched("PWR01".to_string())
        );
        assert_eq!(pending.reply(), Some("PWR01"));
    }

    #[test]
    fn test_only_first_match_counts() {
        let mut pending = PendingReply::new("PWR01", LONG);
        pending.offer("PWR01".to_string());
        assert_eq!(
            pending.offer("PWR00".to_string()),
            Offer::Unrelated("PWR00".to_string())
        );
        assert_eq!(pending.reply(), Some("PWR01"));
    }

    #[test]
    fn test_group_setting_answered_by_mdi() {
        let mut pending = PendingReply::new("MGS<mgs zone=\"1\"><groupid>0</groupid></mgs>", LONG);
        assert!(!pending.accepts("PWR01"));
        assert!(pending.accepts("MDI<mdi/>"));
        assert!(matches!(pending.offer("MDI<mdi/>".into()), Offer::Matched(_)));
    }

    #[test]
    fn test_tv_operation_is_immediate() {
        let mut pending = PendingReply::new("CTVPOWER", LONG);
        assert_eq!(pending.reply(), Some("CTVPOWER"));
        assert_eq!(pending.remaining(), None);
    }

    #[test]
    fn test_deadline() {
        let mut pending = PendingReply::new("PWRQSTN", Duration::ZERO);
        assert_eq!(pending.remaining(), None);
        assert_eq!(pending.state(), &ReplyState::TimedOut);
        assert!(matches!(
            pending.offer("PWR01".to_string()),
            Offer::Unrelated(_)
        ));
        assert!(matches!(
            pending.timeout_error(),
            EiscpError::Timeout { ref message, .. } if message == "PWRQSTN"
        ));
    }
}
