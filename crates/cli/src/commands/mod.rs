//! Command handlers for the ragchat CLI.

pub mod ask;
pub mod ingest;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
