//! Command handler registration
//!
//! The handler table is shared between the registering UI and the
//! dispatch path; updates are partial and merge per key, so a caller can
//! re-register one command without clobbering the rest.

use std::collections::HashMap;
use std::sync::Arc;

use super::Command;

/// A registered command callback; receives the raw utterance and is free
/// to ignore it (only direction handlers typically use it)
pub type CommandHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// A partial set of handler registrations to merge into the table
#[derive(Default)]
pub struct HandlerUpdate {
    entries: Vec<(Command, CommandHandler)>,
}

impl HandlerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `command`; later entries for the same
    /// command in one update win
    pub fn on<F>(mut self, command: Command, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.entries.push((command, Arc::new(handler)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mapping from command to exactly one handler
///
/// Commands with no registered handler dispatch as a no-op.
#[derive(Default)]
pub struct CommandHandlerTable {
    handlers: HashMap<Command, CommandHandler>,
}

impl CommandHandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update: last write wins per key, unspecified keys
    /// retain their previous handler
    pub fn merge(&mut self, update: HandlerUpdate) {
        for (command, handler) in update.entries {
            self.handlers.insert(command, handler);
        }
    }

    /// Snapshot the handler currently registered for `command`
    pub fn get(&self, command: Command) -> Option<CommandHandler> {
        self.handlers.get(&command).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_partial_updates_keep_prior_handlers() {
        let h1 = Arc::new(AtomicUsize::new(0));
        let h2 = Arc::new(AtomicUsize::new(0));

        let mut table = CommandHandlerTable::new();

        let c1 = Arc::clone(&h1);
        table.merge(HandlerUpdate::new().on(Command::Start, move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&h2);
        table.merge(HandlerUpdate::new().on(Command::Stop, move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        }));

        // Both registrations are active simultaneously
        let start = table.get(Command::Start).expect("start handler");
        (*start)("start");
        let stop = table.get(Command::Stop).expect("stop handler");
        (*stop)("stop");
        assert_eq!(h1.load(Ordering::SeqCst), 1);
        assert_eq!(h2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_write_wins_per_key() {
        let old = Arc::new(AtomicUsize::new(0));
        let new = Arc::new(AtomicUsize::new(0));

        let mut table = CommandHandlerTable::new();

        let c = Arc::clone(&old);
        table.merge(HandlerUpdate::new().on(Command::Detect, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        let c = Arc::clone(&new);
        table.merge(HandlerUpdate::new().on(Command::Detect, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let detect = table.get(Command::Detect).expect("detect handler");
        (*detect)("detect");
        assert_eq!(old.load(Ordering::SeqCst), 0);
        assert_eq!(new.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unregistered_command_has_no_handler() {
        let table = CommandHandlerTable::new();
        assert!(table.get(Command::Help).is_none());
    }
}
