//! Durable storage of the last known good registry document.

pub mod digest;
pub mod io;
pub mod store;

pub use io::{CacheIo, StdIo};
pub use store::{CacheAge, CacheRecord, CacheStore, FileCache};
