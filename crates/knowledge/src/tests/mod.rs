//! Pipeline-level tests against in-process fakes.

mod fakes;
mod ingest;
