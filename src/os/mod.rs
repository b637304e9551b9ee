//! OS Layer: wrapper tipis di atas fasilitas platform
//!
//! - Monotonic clock (CLOCK_MONOTONIC / Instant)
//! - Broadcast address discovery (getifaddrs)
//!
//! Ring buffer di `core` tidak bergantung pada modul ini.

mod clock;
mod net_intf;

pub use clock::{ClockError, MonotonicClock};
pub use net_intf::{discover_broadcast_addresses, local_addr, InterfaceAddr};
