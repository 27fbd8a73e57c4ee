//! core
//!
//! Core domain types, path layout, and configuration for mgit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, ObjectKind, BranchName, TagName, RefName
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for `.mgit` storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod paths;
pub mod types;
