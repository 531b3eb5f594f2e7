//! User-visible notices: dismissible, auto-expiring after 5 seconds.
//!
//! Replaces the front-end's alert banners. Notices never contain raw
//! error internals — callers go through `TransportError::user_message`
//! or supply their own text.

use std::time::{Duration, Instant};

use crate::config::NOTICE_TTL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    posted_at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            posted_at: Instant::now(),
        }
    }

    fn expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.posted_at) >= ttl
    }
}

/// Ordered queue of live notices, oldest first.
#[derive(Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice::new(level, text));
    }

    /// Drop expired notices and return the survivors.
    pub fn live(&mut self) -> &[Notice] {
        self.prune_at(Instant::now());
        &self.notices
    }

    /// Dismiss everything immediately.
    pub fn clear(&mut self) {
        self.notices.clear();
    }

    fn prune_at(&mut self, now: Instant) {
        self.notices.retain(|n| !n.expired_at(now, NOTICE_TTL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_notice_is_live() {
        let mut queue = NoticeQueue::new();
        queue.push(NoticeLevel::Success, "Message sent successfully");
        assert_eq!(queue.live().len(), 1);
        assert_eq!(queue.live()[0].level, NoticeLevel::Success);
    }

    #[test]
    fn old_notice_is_pruned() {
        let mut queue = NoticeQueue::new();
        queue.push(NoticeLevel::Info, "stale");
        queue.notices[0].posted_at = Instant::now() - NOTICE_TTL - Duration::from_millis(1);
        queue.push(NoticeLevel::Warning, "fresh");

        let live = queue.live();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].text, "fresh");
    }

    #[test]
    fn clear_dismisses_all() {
        let mut queue = NoticeQueue::new();
        queue.push(NoticeLevel::Danger, "one");
        queue.push(NoticeLevel::Info, "two");
        queue.clear();
        assert!(queue.live().is_empty());
    }
}
