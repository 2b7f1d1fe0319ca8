//! Lock-free data structures
//!
//! ## Modules
//! - `stack` - Treiber stack backed by `crossbeam::epoch` reclamation

pub mod stack;

pub use stack::{LockFreeStack, StackStats};
