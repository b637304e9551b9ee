//! osiring - Lock-Free SPSC Byte Ring Buffer
//!
//! Arsitektur:
//! - `core`: ring buffer byte dengan reserved slot, split producer/consumer
//! - `os`: wrapper tipis untuk monotonic clock dan broadcast address discovery

pub mod core;
pub mod os;

pub use crate::core::{Consumer, Producer, RingBuffer, RingError};
