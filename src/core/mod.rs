//! Core module: Lock-Free SPSC Byte Ring Buffer
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic cursor, tidak ada Mutex/RwLock
//! - No-Allocation: Backing store dialokasi sekali saat `create`
//! - Short transfer: put/get tidak pernah block, cukup return jumlah byte

mod error;
mod ring_buffer;

pub use error::{RingError, RingResult};
pub use ring_buffer::{Consumer, Producer, RingBuffer};
