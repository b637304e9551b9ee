//! Monotonic clock dalam nanodetik
//!
//! Offset diambil saat init, jadi `now()` adalah waktu sejak clock dibuat.
//! Pada Unix memakai `CLOCK_MONOTONIC`, target lain fallback ke `Instant`.

use std::io;

use log::debug;
use thiserror::Error;

const NSEC_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("monotonic clock is not available: {0}")]
    Unavailable(#[source] io::Error),
}

/// Monotonic clock source.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: imp::Origin,
    resolution_ns: u64,
}

impl MonotonicClock {
    /// Membaca resolusi dan offset awal dari platform timer.
    pub fn new() -> Result<Self, ClockError> {
        let resolution_ns = imp::resolution_ns().map_err(ClockError::Unavailable)?;
        let origin = imp::Origin::capture().map_err(ClockError::Unavailable)?;

        debug!("monotonic clock initialised, resolution={}ns", resolution_ns);

        Ok(Self {
            origin,
            resolution_ns,
        })
    }

    /// Resolusi timer dalam nanodetik (minimal 1)
    #[inline]
    pub fn resolution(&self) -> u64 {
        self.resolution_ns
    }

    /// Nanodetik sejak clock dibuat. Non-decreasing.
    #[inline]
    pub fn now(&self) -> Result<u64, ClockError> {
        self.origin.elapsed_ns().map_err(ClockError::Unavailable)
    }
}

#[cfg(unix)]
mod imp {
    use super::NSEC_PER_SEC;
    use std::io;

    #[derive(Debug)]
    pub(super) struct Origin {
        offset_ns: u64,
    }

    impl Origin {
        pub(super) fn capture() -> io::Result<Self> {
            Ok(Self {
                offset_ns: read_ns()?,
            })
        }

        pub(super) fn elapsed_ns(&self) -> io::Result<u64> {
            Ok(read_ns()?.saturating_sub(self.offset_ns))
        }
    }

    pub(super) fn resolution_ns() -> io::Result<u64> {
        // SAFETY: timespec adalah plain C struct, all-zero valid
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        // SAFETY: pointer valid selama call
        if unsafe { libc::clock_getres(libc::CLOCK_MONOTONIC, &mut ts) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(to_ns(&ts).max(1))
    }

    fn read_ns() -> io::Result<u64> {
        // SAFETY: timespec adalah plain C struct, all-zero valid
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        // SAFETY: pointer valid selama call
        if unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(to_ns(&ts))
    }

    #[inline(always)]
    fn to_ns(ts: &libc::timespec) -> u64 {
        (ts.tv_sec as u64)
            .wrapping_mul(NSEC_PER_SEC)
            .wrapping_add(ts.tv_nsec as u64)
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;
    use std::time::Instant;

    #[derive(Debug)]
    pub(super) struct Origin {
        start: Instant,
    }

    impl Origin {
        pub(super) fn capture() -> io::Result<Self> {
            Ok(Self {
                start: Instant::now(),
            })
        }

        pub(super) fn elapsed_ns(&self) -> io::Result<u64> {
            Ok(self.start.elapsed().as_nanos() as u64)
        }
    }

    // Instant tidak expose resolusi; nominal 1ns
    pub(super) fn resolution_ns() -> io::Result<u64> {
        Ok(1)
    }
}
