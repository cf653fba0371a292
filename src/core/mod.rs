// Core modules shared by the library API and the CLI.
pub mod error;
