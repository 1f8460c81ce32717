// Re-export modules for the binary and integration tests
pub mod models;
pub mod store;    // JSON file persistence
pub mod display;  // Console rendering

// Re-export main types for convenience
pub use models::*;
pub use store::{ContactStore, LoadOutcome, StoreConfig, StoreError};
