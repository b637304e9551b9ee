//! osiring demo - Lock-Free SPSC Byte Ring Buffer
//!
//! Menjalankan benchmark singkat ring buffer, lalu menampilkan info
//! monotonic clock dan broadcast address yang ditemukan.

use std::time::Instant;

use log::warn;

use osiring::os::{discover_broadcast_addresses, local_addr, MonotonicClock};
use osiring::RingBuffer;

fn main() {
    env_logger::init();

    println!("🚀 osiring - SPSC Byte Ring Buffer");
    println!("==================================\n");

    benchmark_ring_buffer();
    show_clock();
    show_interfaces();

    println!("\n✅ Done!");
    println!("\nFor a threaded stress run: cargo run --release --bin spsc_stress");
}

fn benchmark_ring_buffer() {
    println!("📊 Ring Buffer Benchmark (Lock-Free SPSC, bytes)");
    println!("------------------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    const CHUNK: usize = 64;

    let mut rb = match RingBuffer::create(64 * 1024) {
        Ok(rb) => rb,
        Err(e) => {
            eprintln!("❌ {}", e);
            return;
        }
    };
    let src = [0xABu8; CHUNK];
    let mut dst = [0u8; CHUNK];

    // Benchmark put (drain kalau penuh)
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        if rb.put(&src) < CHUNK {
            rb.reset();
        }
    }
    let put_duration = start.elapsed();

    rb.reset();
    while rb.put(&src) == CHUNK {}

    // Benchmark get (isi ulang kalau kosong)
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        if rb.get(&mut dst) < CHUNK {
            while rb.put(&src) == CHUNK {}
        }
    }
    let get_duration = start.elapsed();

    let put_ns = put_duration.as_nanos() as f64 / ITERATIONS as f64;
    let get_ns = get_duration.as_nanos() as f64 / ITERATIONS as f64;

    println!("  Chunk size: {} bytes", CHUNK);
    println!("  Operations: {}", ITERATIONS);
    println!("  Put latency: {:.2} ns/op", put_ns);
    println!("  Get latency: {:.2} ns/op", get_ns);
    println!(
        "  Put throughput: {:.2} MB/sec\n",
        (ITERATIONS * CHUNK) as f64 / put_duration.as_secs_f64() / 1_000_000.0
    );
}

fn show_clock() {
    println!("⏱️  Monotonic Clock");
    println!("------------------");

    match MonotonicClock::new() {
        Ok(clock) => {
            println!("  Resolution: {} ns", clock.resolution());
            match clock.now() {
                Ok(now) => println!("  Since init: {} ns\n", now),
                Err(e) => warn!("clock read failed: {}", e),
            }
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}

fn show_interfaces() {
    println!("🌐 Network Interfaces");
    println!("---------------------");

    match local_addr() {
        Ok(Some(addr)) => println!("  Local address: {}", addr),
        Ok(None) => println!("  Local address: <none>"),
        Err(e) => warn!("local address lookup failed: {}", e),
    }

    match discover_broadcast_addresses(None) {
        Ok(found) if found.is_empty() => println!("  No broadcast addresses found"),
        Ok(found) => {
            for intf in found {
                println!("  {:<10} {} (netmask {})", intf.name, intf.addr, intf.netmask);
            }
        }
        Err(e) => warn!("broadcast discovery failed: {}", e),
    }
}
