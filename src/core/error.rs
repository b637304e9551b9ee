//! Error types untuk core ring buffer
//!
//! Short transfer (put/get yang memindahkan lebih sedikit byte dari yang diminta)
//! BUKAN error, melainkan return value biasa. Caller wajib cek jumlahnya.

use thiserror::Error;

pub type RingResult<T, E = RingError> = Result<T, E>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    /// `capacity + 1` tidak muat di `usize`
    #[error("ring capacity {capacity} overflows the backing store size")]
    CapacityOverflow { capacity: usize },

    /// Alokasi backing store ditolak oleh allocator
    #[error("failed to allocate {size} bytes for ring backing store")]
    AllocationFailed { size: usize },
}
