//! Server-side modules for the chapel content server.

pub mod storage;

pub use storage::{init_db, DocumentRepository};
