//! In-memory record of messages already sent downstream

use std::collections::HashSet;

use crate::types::PublishableMessage;

/// Messages this process has already published (or tried to)
///
/// Lives as long as the publisher loop that owns it. It is never pruned and
/// never persisted; a restarted process starts empty and relies on the
/// watermark to keep the search window small.
#[derive(Debug, Default)]
pub struct PostedSet {
    seen: HashSet<PublishableMessage>,
}

impl PostedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, message: &PublishableMessage) -> bool {
        self.seen.contains(message)
    }

    /// Record a message; returns false if it was already present
    pub fn insert(&mut self, message: PublishableMessage) -> bool {
        self.seen.insert(message)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut posted = PostedSet::new();
        let message = PublishableMessage::new("\"Q\" #neo4j https://so/1");

        assert!(!posted.contains(&message));
        assert!(posted.insert(message.clone()));
        assert!(posted.contains(&message));
        assert!(!posted.insert(message), "second insert reports duplicate");
        assert_eq!(posted.len(), 1);
    }

    #[test]
    fn test_starts_empty() {
        assert!(PostedSet::new().is_empty());
    }
}
