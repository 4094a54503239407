//! Concrete implementations of the tool DI traits.

pub mod filesystem;

pub use filesystem::RealFileSystem;
