//! Argument parsing and process-exit-code mapping for the `textpipe` binary,
//! split out of `main.rs` so it can be unit tested without spawning a process.

pub mod cli;
