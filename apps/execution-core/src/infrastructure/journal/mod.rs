//! Exit Journal Adapters
//!
//! Secondary recording path for exits the position store rejected.

mod file;
mod in_memory;

pub use file::FileExitJournal;
pub use in_memory::InMemoryExitJournal;
