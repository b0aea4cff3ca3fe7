//! Chat message log.

use std::collections::VecDeque;

/// Who a log entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed locally.
    Own,
    /// Received from the partner.
    Partner,
    /// Produced by the coordinator (status changes, notifications).
    System,
}

/// One chat log entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    origin: Origin,
    emphasized: bool,
}

impl Message {
    /// A message typed locally.
    pub fn own(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Own, emphasized: false }
    }

    /// A message received from the partner.
    pub fn partner(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Partner, emphasized: false }
    }

    /// A system entry.
    pub fn system(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::System, emphasized: false }
    }

    /// A system entry the view should call attention to.
    pub fn system_emphasized(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::System, emphasized: true }
    }

    /// Entry text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Who produced the entry.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Whether the view should call attention to the entry.
    #[must_use]
    pub fn emphasized(&self) -> bool {
        self.emphasized
    }
}

/// Append-only ordered chat record, scoped to one session.
///
/// Bounded ring: at capacity the oldest entry drops. Cleared by the
/// coordinator when the session returns to Idle; no merging, no
/// deduplication.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Message>,
    capacity: usize,
}

impl MessageLog {
    /// Create a log bounded to `capacity` entries. A zero capacity is
    /// bumped to one so pushes are never silently dropped whole.
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::new(), capacity: capacity.max(1) }
    }

    /// Append an entry, evicting the oldest at capacity.
    pub fn push(&mut self, message: Message) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.entries.back()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageLog, Origin};

    #[test]
    fn append_order_is_preserved() {
        let mut log = MessageLog::new(8);
        log.push(Message::own("hi"));
        log.push(Message::partner("hey"));
        log.push(Message::system("partner connected"));

        let origins: Vec<Origin> = log.iter().map(Message::origin).collect();
        assert_eq!(origins, vec![Origin::Own, Origin::Partner, Origin::System]);
    }

    #[test]
    fn ring_evicts_oldest_at_capacity() {
        let mut log = MessageLog::new(2);
        log.push(Message::own("a"));
        log.push(Message::own("b"));
        log.push(Message::own("c"));

        assert_eq!(log.len(), 2);
        let texts: Vec<&str> = log.iter().map(Message::text).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_still_holds_the_latest_entry() {
        let mut log = MessageLog::new(0);
        log.push(Message::own("a"));
        log.push(Message::own("b"));
        assert_eq!(log.last().map(Message::text), Some("b"));
        assert_eq!(log.len(), 1);
    }
}
