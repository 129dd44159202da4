//! statusmon-state: persistent last-known status per service.
//!
//! Backed by [redb](https://docs.rs/redb). A single table maps the service
//! name to the raw bytes `UP` or `DOWN`. Values are decoded at the edge:
//! callers only ever see `Option<Status>`, and an entry that fails to decode
//! reads back as `None`.
//!
//! The `StatusStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is shared by every check task in a run. redb serializes write
//! transactions, so concurrent writes to distinct services never interleave.
//! `StatusReader` is the read-only counterpart used by the `status` command.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{StatusEntry, StatusReader, StatusStore};
