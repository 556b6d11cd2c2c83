// # Persistence Backends
//
// This module provides implementations of the Persistence trait for
// different durability needs.

pub mod file;
pub mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;
