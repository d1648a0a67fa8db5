// tasklist - task list manager persisted to a key-value blob store

pub mod blob;
pub mod config;
pub mod filter;
pub mod record;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore, SqliteBlobStore, now_ms};
pub use config::{Backend, Config};
pub use filter::{Filter, FilterOp};
pub use record::{IndexValue, Record};
pub use store::TaskStore;
pub use task::{DEFAULT_COLOR, IdGenerator, Priority, SequentialIds, TASKS_KEY, Task, TaskDraft, UuidGenerator};
