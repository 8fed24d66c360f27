//! Filedock Object Storage Layer
//!
//! Thin wrapper over `object_store`: the rest of the system treats this
//! as an opaque key-value store with list/get/put/delete and
//! prefix-enumeration operations over a `/`-separated namespace.

pub mod error;
mod store;

pub use error::StorageError;
pub use store::{FileStore, FolderEntry, Listing, ObjectInfo};
