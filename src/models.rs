use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used when stamping new messages
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised when mutating a [`ContactBook`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    /// The named contact is not in the book
    #[error("Unknown contact: {0}")]
    UnknownContact(String),
}

/// When a message was sent or received.
///
/// Older contact files carry preformatted strings while some producers write
/// epoch seconds, whole or fractional. Any JSON number or string is accepted,
/// shown as stored and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTime {
    Epoch(serde_json::Number),
    Text(String),
}

impl fmt::Display for MessageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageTime::Text(text) => f.write_str(text),
            MessageTime::Epoch(secs) => write!(f, "{}", secs),
        }
    }
}

impl From<&str> for MessageTime {
    fn from(text: &str) -> Self {
        MessageTime::Text(text.to_string())
    }
}

impl From<String> for MessageTime {
    fn from(text: String) -> Self {
        MessageTime::Text(text)
    }
}

impl From<i64> for MessageTime {
    fn from(secs: i64) -> Self {
        MessageTime::Epoch(secs.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub time: MessageTime,
    pub to: String,
    pub from: String,
    pub contents: String,
}

impl Message {
    pub fn new(time: impl Into<MessageTime>, from: &str, to: &str, contents: &str) -> Self {
        Message {
            time: time.into(),
            to: to.to_string(),
            from: from.to_string(),
            contents: contents.to_string(),
        }
    }

    /// Build a message stamped with the current local time
    pub fn now(from: &str, to: &str, contents: &str) -> Self {
        let now: DateTime<Local> = Local::now();
        Self::new(now.format(TIME_FORMAT).to_string(), from, to, contents)
    }
}

/// A known peer. The name lives in the [`ContactBook`] key, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub messages: Vec<Message>, // Oldest first
}

impl Contact {
    pub fn new(ip: &str, fingerprint: &str) -> Self {
        Contact {
            ip: ip.to_string(),
            fingerprint: fingerprint.to_string(),
            messages: Vec::new(),
        }
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// All contacts keyed by display name.
///
/// Serializes as a plain JSON object so the file layout is
/// `{ "<name>": { "ip": .., "fingerprint": .., "messages": [..] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactBook {
    contacts: BTreeMap<String, Contact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contacts.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Contact> {
        self.contacts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Contact> {
        self.contacts.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contacts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Contact> {
        self.contacts.iter()
    }

    /// Insert a contact, replacing any existing entry with the same name
    pub fn insert(&mut self, name: &str, contact: Contact) -> Option<Contact> {
        self.contacts.insert(name.to_string(), contact)
    }

    /// Add a new contact or refresh the address and fingerprint of an
    /// existing one. Message history is kept.
    pub fn upsert_contact(&mut self, name: &str, ip: &str, fingerprint: &str) -> &mut Contact {
        let contact = self.contacts.entry(name.to_string()).or_default();
        contact.ip = ip.to_string();
        contact.fingerprint = fingerprint.to_string();
        contact
    }

    pub fn remove_contact(&mut self, name: &str) -> Option<Contact> {
        self.contacts.remove(name)
    }

    pub fn append_message(&mut self, name: &str, message: Message) -> Result<(), BookError> {
        let contact = self
            .contacts
            .get_mut(name)
            .ok_or_else(|| BookError::UnknownContact(name.to_string()))?;
        contact.messages.push(message);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ContactBook {
    type Item = (&'a String, &'a Contact);
    type IntoIter = btree_map::Iter<'a, String, Contact>;

    fn into_iter(self) -> Self::IntoIter {
        self.contacts.iter()
    }
}
