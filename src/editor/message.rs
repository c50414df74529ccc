use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Disappears after the configured timeout.
    Transient,
    /// Stays until replaced.
    Persistent,
    /// Stays until the user acts.
    Error,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
    created: Instant,
}

/// The single status-line message slot of a pane.
#[derive(Debug, Clone)]
pub struct MessageManager {
    current: Option<Message>,
    timeout: Duration,
}

impl Default for MessageManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl MessageManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            current: None,
            timeout,
        }
    }

    pub fn set_transient(&mut self, text: impl Into<String>) {
        self.set(text.into(), MessageKind::Transient);
    }

    pub fn set_persistent(&mut self, text: impl Into<String>) {
        self.set(text.into(), MessageKind::Persistent);
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.set(text.into(), MessageKind::Error);
    }

    fn set(&mut self, text: String, kind: MessageKind) {
        self.current = Some(Message {
            text,
            kind,
            created: Instant::now(),
        });
    }

    /// The live message, skipping a transient one that has timed out.
    pub fn get(&self) -> Option<&Message> {
        self.current.as_ref().filter(|m| !self.is_expired(m))
    }

    /// Drop an expired transient message. Returns true if one was dropped.
    pub fn expire(&mut self) -> bool {
        let expired = matches!(&self.current, Some(m) if self.is_expired(m));
        if expired {
            self.current = None;
        }
        expired
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Called on user input: errors and transients give way, persistent
    /// messages stay.
    pub fn clear_if_transient(&mut self) {
        if matches!(&self.current, Some(m) if m.kind != MessageKind::Persistent) {
            self.current = None;
        }
    }

    fn is_expired(&self, message: &Message) -> bool {
        message.kind == MessageKind::Transient && message.created.elapsed() >= self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_expires() {
        let mut messages = MessageManager::new(Duration::ZERO);
        messages.set_transient("saved");
        assert!(messages.get().is_none());
        assert!(messages.expire());
        assert!(!messages.expire());
    }

    #[test]
    fn test_persistent_and_error_do_not_expire() {
        let mut messages = MessageManager::new(Duration::ZERO);
        messages.set_persistent("Find: x");
        assert_eq!(messages.get().map(|m| m.text.as_str()), Some("Find: x"));
        messages.set_error("boom");
        assert!(!messages.expire());
        assert_eq!(messages.get().map(|m| m.kind), Some(MessageKind::Error));
    }

    #[test]
    fn test_clear_if_transient_keeps_persistent() {
        let mut messages = MessageManager::default();
        messages.set_persistent("keep");
        messages.clear_if_transient();
        assert!(messages.get().is_some());

        messages.set_error("drop");
        messages.clear_if_transient();
        assert!(messages.get().is_none());
    }
}
