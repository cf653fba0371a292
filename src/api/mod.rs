//! Purpose: Define the stable public Rust API for the satchel client.
//! Exports: Document refs, the remote store, and the shared error types.
//! Role: Public, additive-only surface; the CLI is built entirely on it.
//! Invariants: This module is the only public path to the HTTP plumbing.
//! Invariants: Failures are tagged `Error` values; no sentinel results.

mod doc;
mod remote;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use doc::{ApiResult, DocRef};
pub use remote::{RemoteDoc, RemoteStore};
