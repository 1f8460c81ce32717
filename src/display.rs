// Console rendering for contacts and conversations.
// Every function has a `*_to` form that writes to any `io::Write` and a
// stdout form for the command line.

use std::io::{self, Write};

use crossterm::style::Stylize;
use thiserror::Error;

use crate::models::{Contact, ContactBook};

/// Messages shorter than this are shown whole in the summary
pub const PREVIEW_THRESHOLD: usize = 20;

/// Characters kept when a summary preview is cut short
pub const PREVIEW_LENGTH: usize = 27;

pub const NO_MESSAGES: &str = "-- No messages --";

const CONVO_HEADER: &str = "CONVERSATION";
const BAR_WIDTH: usize = 50;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Unknown contact: {0}")]
    UnknownContact(String),

    #[error("Console write failed: {0}")]
    Io(#[from] io::Error),
}

pub fn print_green(text: &str) {
    let _ = print_green_to(&mut io::stdout().lock(), text);
}

pub fn print_red(text: &str) {
    let _ = print_red_to(&mut io::stderr().lock(), text);
}

pub fn print_green_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text.green())
}

pub fn print_red_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text.red())
}

/// Section header like `------ CONVERSATION ------`
pub fn print_bar_to<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{:-^width$}", format!(" {} ", title), width = BAR_WIDTH)
}

/// Summary text for a message: whole if short, otherwise cut with `...`.
///
/// The cut-off and the kept length differ on purpose (20 vs 27).
pub fn preview(contents: &str) -> String {
    if contents.chars().count() < PREVIEW_THRESHOLD {
        contents.to_string()
    } else {
        let mut cut: String = contents.chars().take(PREVIEW_LENGTH).collect();
        cut.push_str("...");
        cut
    }
}

pub fn display_contact(name: &str, contacts: &ContactBook) -> Result<(), DisplayError> {
    display_contact_to(&mut io::stdout().lock(), name, contacts)
}

/// Show name, address and fingerprint of one contact
pub fn display_contact_to<W: Write>(
    out: &mut W,
    name: &str,
    contacts: &ContactBook,
) -> Result<(), DisplayError> {
    let contact = contacts
        .get(name)
        .ok_or_else(|| DisplayError::UnknownContact(name.to_string()))?;

    print_green_to(out, name)?;
    writeln!(out, "IP: {}", contact.ip)?;
    writeln!(out, "Fingerprint: {}", contact.fingerprint)?;
    writeln!(out)?;
    Ok(())
}

pub fn display_convo(contact: &Contact) -> io::Result<()> {
    display_convo_to(&mut io::stdout().lock(), contact)
}

pub fn display_convo_to<W: Write>(out: &mut W, contact: &Contact) -> io::Result<()> {
    print_bar_to(out, CONVO_HEADER)?;
    for message in &contact.messages {
        writeln!(out, "{} {}: {}", message.time, message.from, message.contents)?;
    }
    writeln!(out)
}

pub fn display_messages(contacts: &ContactBook) -> io::Result<()> {
    display_messages_to(&mut io::stdout().lock(), contacts)
}

/// One summary line per contact with the latest message, then a blank line
pub fn display_messages_to<W: Write>(out: &mut W, contacts: &ContactBook) -> io::Result<()> {
    for (name, contact) in contacts {
        match contact.last_message() {
            Some(last) => writeln!(
                out,
                "{:<10}  >  {:<30}  <  {}",
                name,
                preview(&last.contents),
                last.time
            )?,
            None => writeln!(out, "{:<10}  >  {:^30}  <", name, NO_MESSAGES)?,
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_threshold() {
        let nineteen = "a".repeat(19);
        let twenty = "b".repeat(20);

        assert_eq!(preview(&nineteen), nineteen);
        // 20 chars is already "long" but only 27 are kept, so nothing is cut
        assert_eq!(preview(&twenty), format!("{}...", twenty));
    }

    #[test]
    fn test_preview_long_text() {
        let long = "The quick brown fox jumps over the lazy dog";
        assert_eq!(preview(long), "The quick brown fox jumps o...");
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        let accents = "é".repeat(30);
        let shown = preview(&accents);

        assert_eq!(shown.chars().count(), PREVIEW_LENGTH + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_bar_width() {
        let mut out = Vec::new();
        print_bar_to(&mut out, "CONVERSATION").unwrap();
        let line = String::from_utf8(out).unwrap();

        assert_eq!(line.trim_end().chars().count(), BAR_WIDTH);
        assert!(line.contains(" CONVERSATION "));
    }
}
