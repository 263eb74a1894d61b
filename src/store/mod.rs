//! Persistence layer: saves and restores conversations at their boundaries.

pub mod crypto;
pub mod file;
pub mod traits;

pub use crypto::SealingKey;
pub use file::FileSessionStore;
pub use traits::{SessionRecord, SessionStore, DATA_VERSION};
