//! Byte source implementations

pub mod channel;
pub mod memory;
pub mod reader;

pub use channel::{ChannelSource, ChunkSender};
pub use memory::MemorySource;
pub use reader::{DEFAULT_CHUNK_SIZE, ReaderSource};
