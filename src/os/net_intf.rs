//! Network interface discovery: broadcast address dan local address
//!
//! Hanya interface IPv4 yang UP dan bukan loopback yang dipakai.
//! Hasil dikembalikan sebagai `Vec` milik caller; kalau list itu di-share
//! antar thread, locking menjadi urusan caller.

use std::io;
use std::net::Ipv4Addr;

use log::{debug, warn};

/// Alamat tujuan discovery untuk satu interface.
///
/// `addr` adalah broadcast address (interface broadcast) atau destination
/// address (point-to-point). Untuk point-to-point, `netmask` = `0.0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub addr: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, Default)]
struct IfFlags {
    up: bool,
    loopback: bool,
    broadcast: bool,
    point_to_point: bool,
}

/// Snapshot satu interface IPv4 dari OS
#[derive(Debug, Clone)]
struct IfEntry {
    name: String,
    flags: IfFlags,
    addr: Ipv4Addr,
    netmask: Option<Ipv4Addr>,
    // broadcast address atau destination address, tergantung flags
    peer: Option<Ipv4Addr>,
}

/// Cari broadcast (atau point-to-point destination) address tiap interface.
///
/// `match_addr` = `None` atau `Some(0.0.0.0)` berarti semua interface;
/// selain itu hanya interface dengan address persis sama.
pub fn discover_broadcast_addresses(match_addr: Option<Ipv4Addr>) -> io::Result<Vec<InterfaceAddr>> {
    let entries = imp::interfaces()?;
    Ok(select_broadcast(&entries, match_addr))
}

/// Address IPv4 pertama dari interface yang UP dan bukan loopback.
pub fn local_addr() -> io::Result<Option<Ipv4Addr>> {
    let entries = imp::interfaces()?;
    Ok(select_local(&entries))
}

fn usable(entry: &IfEntry) -> bool {
    if !entry.flags.up {
        debug!("net intf \"{}\" was down", entry.name);
        return false;
    }
    if entry.flags.loopback {
        debug!("ignoring loopback interface \"{}\"", entry.name);
        return false;
    }
    true
}

fn select_broadcast(entries: &[IfEntry], match_addr: Option<Ipv4Addr>) -> Vec<InterfaceAddr> {
    let wanted = match_addr.filter(|addr| !addr.is_unspecified());
    let mut found = Vec::new();

    for entry in entries {
        if let Some(wanted) = wanted {
            if entry.addr != wanted {
                debug!("net intf \"{}\" didn't match {}", entry.name, wanted);
                continue;
            }
        }

        if !usable(entry) {
            continue;
        }

        let (addr, netmask) = if entry.flags.broadcast {
            let Some(broadcast) = entry.peer else {
                warn!("net intf \"{}\": broadcast address unavailable", entry.name);
                continue;
            };
            let Some(netmask) = entry.netmask else {
                warn!("net intf \"{}\": net mask unavailable", entry.name);
                continue;
            };
            (broadcast, netmask)
        } else if entry.flags.point_to_point {
            let Some(dest) = entry.peer else {
                debug!("net intf \"{}\": point-to-point address unavailable", entry.name);
                continue;
            };
            (dest, Ipv4Addr::UNSPECIFIED)
        } else {
            debug!("net intf \"{}\": neither broadcast nor point-to-point", entry.name);
            continue;
        };

        debug!("net intf \"{}\" found: {} / {}", entry.name, addr, netmask);
        found.push(InterfaceAddr {
            name: entry.name.clone(),
            addr,
            netmask,
        });
    }

    found
}

fn select_local(entries: &[IfEntry]) -> Option<Ipv4Addr> {
    entries.iter().find(|entry| usable(entry)).map(|entry| entry.addr)
}

#[cfg(unix)]
mod imp {
    use super::{IfEntry, IfFlags};
    use std::ffi::CStr;
    use std::io;
    use std::net::Ipv4Addr;
    use std::ptr;

    use log::debug;

    pub(super) fn interfaces() -> io::Result<Vec<IfEntry>> {
        let mut head: *mut libc::ifaddrs = ptr::null_mut();
        // SAFETY: getifaddrs mengisi head dengan list milik libc
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut entries = Vec::new();
        let mut cur = head;
        while !cur.is_null() {
            // SAFETY: node valid sampai freeifaddrs
            let ifa = unsafe { &*cur };
            cur = ifa.ifa_next;

            let name = if ifa.ifa_name.is_null() {
                String::new()
            } else {
                // SAFETY: ifa_name adalah C string null-terminated
                unsafe { CStr::from_ptr(ifa.ifa_name) }
                    .to_string_lossy()
                    .into_owned()
            };

            // SAFETY: pointer sockaddr dari getifaddrs (boleh null)
            let Some(addr) = (unsafe { ipv4_of(ifa.ifa_addr) }) else {
                debug!("interface \"{}\" was not AF_INET", name);
                continue;
            };

            let raw = ifa.ifa_flags as libc::c_int;
            let flags = IfFlags {
                up: raw & libc::IFF_UP != 0,
                loopback: raw & libc::IFF_LOOPBACK != 0,
                broadcast: raw & libc::IFF_BROADCAST != 0,
                point_to_point: raw & libc::IFF_POINTOPOINT != 0,
            };

            entries.push(IfEntry {
                name,
                flags,
                addr,
                // SAFETY: sama seperti ifa_addr
                netmask: unsafe { ipv4_of(ifa.ifa_netmask) },
                peer: unsafe { ipv4_of(peer_of(ifa)) },
            });
        }

        // SAFETY: head berasal dari getifaddrs yang sukses
        unsafe { libc::freeifaddrs(head) };
        Ok(entries)
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn peer_of(ifa: &libc::ifaddrs) -> *const libc::sockaddr {
        ifa.ifa_ifu
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn peer_of(ifa: &libc::ifaddrs) -> *const libc::sockaddr {
        ifa.ifa_dstaddr
    }

    /// # Safety
    /// `sa` harus null atau menunjuk sockaddr yang valid.
    unsafe fn ipv4_of(sa: *const libc::sockaddr) -> Option<Ipv4Addr> {
        if sa.is_null() || (*sa).sa_family as libc::c_int != libc::AF_INET {
            return None;
        }
        let sin = ptr::read_unaligned(sa as *const libc::sockaddr_in);
        Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)))
    }
}

#[cfg(not(unix))]
mod imp {
    use super::IfEntry;
    use std::io;

    pub(super) fn interfaces() -> io::Result<Vec<IfEntry>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "interface enumeration is only implemented for unix targets",
        ))
    }
}
