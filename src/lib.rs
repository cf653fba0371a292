//! Purpose: Library crate behind the `satchel` CLI: fetch/save JSON documents over HTTP.
//! Exports: `api` (document store, refs, errors) and `core` (error modeling).
//! Role: Small stable client surface; the CLI and tests are thin layers over it.
//! Invariants: One API call maps to exactly one HTTP request; no caching or retries.
//! Invariants: The library logs through `tracing` and never writes to stdout or stderr.
pub mod api;
pub mod core;
