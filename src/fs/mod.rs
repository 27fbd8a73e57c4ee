//! fs
//!
//! Filesystem capability consumed by the repository engine.
//!
//! # Architecture
//!
//! The engine reaches the host filesystem only through the [`FileSystem`]
//! trait, which has two implementations:
//!
//! - [`LocalFileSystem`]: the real disk via `std::fs` (used by the CLI)
//! - [`MemoryFileSystem`]: an in-memory tree (used by unit tests)
//!
//! # Example
//!
//! ```
//! use mgit::fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
//!
//! let real: Box<dyn FileSystem> = Box::new(LocalFileSystem::new());
//! let fake: Box<dyn FileSystem> = Box::new(MemoryFileSystem::new());
//! # let _ = (real, fake);
//! ```

mod local;
mod memory;
mod traits;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;
pub use traits::{DirEntry, EntryKind, FileSystem, FsError, WalkEntry};
