// Common test utilities for integration tests

use std::sync::Once;

use log::LevelFilter;

use contactbook::{Contact, ContactBook, Message};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// A small book with one quiet contact and one with a short conversation
pub fn sample_book() -> ContactBook {
    let mut book = ContactBook::new();
    book.insert("alice", Contact::new("10.0.0.1", "AA:BB"));

    let mut bob = Contact::new("10.0.0.2", "CC:DD:EE");
    bob.messages.push(Message::new("2024-03-01 09:00:00", "bob", "me", "are you there?"));
    bob.messages.push(Message::new("2024-03-01 09:01:30", "me", "bob", "yes"));
    bob.messages.push(Message::new(1709283720_i64, "bob", "me", "great, the meeting moved to friday afternoon"));
    book.insert("bob", bob);

    book
}

/// Run a display function against a buffer and return what it wrote
pub fn render<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
{
    let mut out = Vec::new();
    f(&mut out).expect("writing to a Vec should not fail");
    String::from_utf8(out).expect("display output should be UTF-8")
}
