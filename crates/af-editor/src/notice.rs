//! Transient user-facing messages.
//!
//! Time is passed in by the host so the editor stays free of clocks and
//! timers; `Duration` is measured from an arbitrary host epoch.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: Duration,
}

/// Queue of notices that expire after a fixed time-to-live.
#[derive(Debug)]
pub struct Notices {
    ttl: Duration,
    items: Vec<Notice>,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, now: Duration) {
        let message = message.into();
        log::info!("notice: {message}");
        self.items.push(Notice {
            message,
            expires_at: now + self.ttl,
        });
    }

    /// Notices still visible at `now`, oldest first.
    pub fn active(&self, now: Duration) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter(move |n| n.expires_at > now)
    }

    /// Drop expired notices. Returns whether any were removed.
    pub fn prune(&mut self, now: Duration) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.expires_at > now);
        self.items.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire_after_ttl() {
        let mut notices = Notices::new(Duration::from_secs(3));
        notices.push("first", Duration::from_millis(0));
        notices.push("second", Duration::from_millis(1000));

        let at = |ms| Duration::from_millis(ms);
        assert_eq!(notices.active(at(2999)).count(), 2);
        assert_eq!(
            notices.active(at(3000)).map(|n| n.message.as_str()).collect::<Vec<_>>(),
            vec!["second"]
        );
        assert!(notices.prune(at(3500)));
        assert!(!notices.prune(at(3600)));
        assert!(notices.prune(at(4000)));
        assert!(notices.is_empty());
    }
}
