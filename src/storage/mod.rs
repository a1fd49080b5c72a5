//! Storage module
//!
//! Lists and opens the files a table is built from.
//!
//! # Overview
//!
//! - `FileStore` - Storage capability: list objects, open one for reading
//! - `ObjectStoreFiles` - `object_store` backed store (S3, R2, GCS, Azure, local)
//! - `MemoryFileStore` - In-memory store with explicit modification times
//! - `FileSelector` - Pattern and watermark filtering for one table
//! - `ChunkReader` - Blocking `Read` over a streamed object body

mod chunked;
mod memory;
mod object;
mod selector;
mod types;

pub use chunked::ChunkReader;
pub use memory::MemoryFileStore;
pub use object::ObjectStoreFiles;
pub use selector::{sort_for_replay, FileSelector};
pub use types::{ByteStream, FileDescriptor, FileStore};

#[cfg(test)]
mod tests;
