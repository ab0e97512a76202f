//! Vector index backends.

pub mod local;
pub mod pinecone;

pub use local::LocalIndex;
pub use pinecone::{PineconeConfig, PineconeIndex};
