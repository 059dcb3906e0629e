//! Post repository implementations.

pub mod memory;

pub use memory::InMemoryPostRepository;
