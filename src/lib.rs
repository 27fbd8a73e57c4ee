//! mgit - A minimal content-addressed version control engine
//!
//! mgit snapshots a working directory into immutable objects, names
//! snapshots with references, and walks, diffs, and merges the resulting
//! commit graph.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to repo)
//! - [`repo`] - Repository handle: objects, refs, trees, commits, diff/merge
//! - [`core`] - Domain types, path layout, and configuration
//! - [`fs`] - Filesystem capability the engine runs on
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! mgit maintains the following invariants:
//!
//! 1. Stored objects are never modified or deleted
//! 2. An object's id is the SHA-1 of its kind tag and payload
//! 3. HEAD is only moved after the working directory was written
//! 4. No operation runs against a directory without a store

pub mod cli;
pub mod core;
pub mod fs;
pub mod repo;
pub mod ui;
