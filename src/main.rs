#![deny(dead_code)]
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;

mod utils;

use contactbook::display::{self, print_red};
use contactbook::{ContactBook, ContactStore, Message, StoreConfig};

const LOG_DIR_NAME: &str = "contactbook";
const LOG_FILE_NAME: &str = "contactbook.log";

/// Command line arguments for contactbook
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "contactbook: keep track of chat peers and their message history.",
    long_about = "contactbook stores peers (address, key fingerprint, messages) in a JSON file.\n\n\
    The data directory is chosen from --data-dir, then --user-data, then the CONTACTS_DIR\n\
    environment variable, and finally ./data/contacts."
)]
struct Args {
    /// Directory holding contacts.json
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Store contacts under the platform data directory
    #[arg(long, conflicts_with = "data_dir")]
    user_data: bool,

    /// Write logs here instead of <cache dir>/contactbook/contactbook.log
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize every contact with its latest message
    List,
    /// Show one contact and the full conversation
    Show { name: String },
    /// Add a contact, or update its address and fingerprint
    Add {
        name: String,
        #[arg(long, default_value = "")]
        ip: String,
        #[arg(long, default_value = "")]
        fingerprint: String,
    },
    /// Forget a contact and its history
    Remove { name: String },
    /// Record a message in a contact's history
    Log {
        name: String,
        /// Sender identifier
        #[arg(long)]
        from: String,
        /// Recipient identifier, defaults to the contact name
        #[arg(long)]
        to: Option<String>,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

impl Command {
    /// Whether the command saves the book afterwards
    fn mutates(&self) -> bool {
        !matches!(self, Command::List | Command::Show { .. })
    }
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    if let Some(dir) = &args.data_dir {
        return Ok(StoreConfig::new(dir.clone()));
    }
    if args.user_data {
        return StoreConfig::user_data_dir();
    }
    Ok(StoreConfig::from_env())
}

/// Pick the log file. Logs stay out of the data directory so that only
/// `load`/`save` decide when that directory comes into existence.
fn log_file_path(args: &Args) -> Option<PathBuf> {
    if let Some(path) = &args.log_file {
        return Some(path.clone());
    }
    let dir = dirs::cache_dir()?.join(LOG_DIR_NAME);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: Failed to create {}: {}. Logging to stderr.", dir.display(), e);
        return None;
    }
    Some(dir.join(LOG_FILE_NAME))
}

fn save_or_report(store: &ContactStore, contacts: &ContactBook) -> Result<()> {
    if let Err(e) = store.save(contacts) {
        print_red(&format!("Error: {}", e));
        return Err(e.into());
    }
    Ok(())
}

fn run(command: Command, store: &ContactStore, contacts: &mut ContactBook) -> Result<()> {
    match command {
        Command::List => display::display_messages(contacts)?,
        Command::Show { name } => {
            display::display_contact(&name, contacts)?;
            if let Some(contact) = contacts.get(&name) {
                display::display_convo(contact)?;
            }
        }
        Command::Add { name, ip, fingerprint } => {
            contacts.upsert_contact(&name, &ip, &fingerprint);
            save_or_report(store, contacts)?;
            display::display_contact(&name, contacts)?;
        }
        Command::Remove { name } => {
            if contacts.remove_contact(&name).is_none() {
                print_red(&format!("Error: No contact named {}", name));
                return Err(anyhow!("unknown contact {}", name));
            }
            save_or_report(store, contacts)?;
            info!("Removed contact {}", name);
        }
        Command::Log { name, from, to, text } => {
            let to = to.unwrap_or_else(|| name.clone());
            let message = Message::now(&from, &to, &text.join(" "));
            contacts.append_message(&name, message)?;
            save_or_report(store, contacts)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = store_config(&args)?;

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let log_file = log_file_path(&args);
    let level = if log_file.is_some() { level } else { LevelFilter::Warn };
    utils::setup_logging(log_file.as_deref(), level)?;

    let store = ContactStore::new(config);
    info!("Using contacts file {}", store.path().display());

    let command = args.command.unwrap_or(Command::List);
    let mut contacts = load_for(&command, &store)?;

    run(command, &store, &mut contacts)
}

/// Load the book. Read-only commands carry on with an empty book after a
/// load problem; commands that save refuse, so the unreadable file survives.
fn load_for(command: &Command, store: &ContactStore) -> Result<ContactBook> {
    let outcome = store.load();
    if !command.mutates() {
        if let Some(problem) = &outcome.problem {
            print_red(&format!("Error: {}", problem));
        }
        return Ok(outcome.into_contacts());
    }

    match outcome.into_writable() {
        Ok(contacts) => Ok(contacts),
        Err(problem) => {
            print_red(&format!("Error: {}", problem));
            print_red(&format!("Refusing to overwrite {}", store.path().display()));
            Err(problem.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactbook::StoreError;
    use tempfile::tempdir;

    fn add_alice() -> Command {
        Command::Add {
            name: "alice".to_string(),
            ip: "10.0.0.1".to_string(),
            fingerprint: String::new(),
        }
    }

    #[test]
    fn test_only_saving_commands_mutate() {
        assert!(!Command::List.mutates());
        assert!(!Command::Show { name: "alice".to_string() }.mutates());
        assert!(add_alice().mutates());
        assert!(Command::Remove { name: "alice".to_string() }.mutates());
    }

    #[test]
    fn test_corrupt_file_blocks_mutating_commands() -> Result<()> {
        let temp_dir = tempdir()?;
        let store = ContactStore::new(StoreConfig::new(temp_dir.path()));
        let original = r#"{"alice": {"ip": 42}}"#;
        std::fs::write(store.path(), original)?;

        let err = load_for(&add_alice(), &store).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Corrupt { .. })));
        assert_eq!(std::fs::read_to_string(store.path())?, original, "File must be left untouched");

        // Listing still works on the empty fallback
        assert!(load_for(&Command::List, &store)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_default_log_path_leaves_data_dir_alone() -> Result<()> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join("data");
        let args = Args::parse_from(["contactbook", "--data-dir", data_dir.to_str().unwrap(), "list"]);

        let log_file = log_file_path(&args);

        assert!(!data_dir.exists(), "Logging must not create the data directory");
        if let Some(path) = log_file {
            assert!(!path.starts_with(&data_dir));
        }
        Ok(())
    }
}
