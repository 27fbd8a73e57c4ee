//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so quiet mode is
//! honored consistently. Diagnostics for developers go through `tracing`
//! instead.

pub mod output;
