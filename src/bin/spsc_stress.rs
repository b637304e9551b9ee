//! SPSC Stress Binary
//!
//! Satu producer thread dan satu consumer thread memompa byte lewat ring
//! buffer tanpa lock. Consumer memverifikasi urutan setiap byte.
//!
//! Usage:
//!   cargo run --release --bin spsc_stress -- [OPTIONS]

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use clap::Parser;
use log::{debug, info};

use osiring::os::MonotonicClock;
use osiring::RingBuffer;

/// Stress configuration
#[derive(Parser, Debug)]
#[command(name = "spsc_stress", version, about = "Lock-free SPSC byte ring stress test")]
struct StressConfig {
    /// Ring capacity in bytes
    #[arg(short, long, default_value_t = 64 * 1024)]
    capacity: usize,

    /// Total bytes pushed through the ring
    #[arg(short, long, default_value_t = 256 * 1024 * 1024)]
    total_bytes: u64,

    /// Max bytes per put/get call
    #[arg(long, default_value_t = 1500)]
    chunk: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Stress statistics
struct StressStats {
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    short_writes: AtomicU64,
    short_reads: AtomicU64,
    order_errors: AtomicU64,
}

impl StressStats {
    fn new() -> Self {
        Self {
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            short_writes: AtomicU64::new(0),
            short_reads: AtomicU64::new(0),
            order_errors: AtomicU64::new(0),
        }
    }

    fn print_report(&self, elapsed_ns: u64) {
        let written = self.bytes_written.load(Ordering::Relaxed);
        let read = self.bytes_read.load(Ordering::Relaxed);
        let short_writes = self.short_writes.load(Ordering::Relaxed);
        let short_reads = self.short_reads.load(Ordering::Relaxed);
        let errors = self.order_errors.load(Ordering::Relaxed);

        let secs = (elapsed_ns as f64 / 1e9).max(f64::EPSILON);

        println!("\n📊 SPSC STRESS RESULTS");
        println!("======================");
        println!("  Duration:      {:.3}s", secs);
        println!("  Written:       {} bytes", written);
        println!("  Read:          {} bytes", read);
        println!("  Short writes:  {}", short_writes);
        println!("  Short reads:   {}", short_reads);
        println!("  Order errors:  {}", errors);
        println!("  Throughput:    {:.2} MB/sec", read as f64 / secs / 1_000_000.0);

        if errors == 0 && written == read {
            println!("\n✅ STRESS TEST PASSED");
        } else {
            println!("\n⚠️  STRESS TEST FAILED");
        }
    }

    fn passed(&self) -> bool {
        self.order_errors.load(Ordering::Relaxed) == 0
            && self.bytes_written.load(Ordering::Relaxed) == self.bytes_read.load(Ordering::Relaxed)
    }
}

// Byte ke-n dari stream deterministik
#[inline(always)]
fn pattern(n: u64) -> u8 {
    (n % 251) as u8
}

fn run_stress(config: &StressConfig) -> Result<StressStats, Box<dyn std::error::Error>> {
    // Kapasitas 0 tidak pernah menerima byte: producer akan spin selamanya
    if config.capacity == 0 {
        return Err("capacity must be greater than zero".into());
    }

    let mut ring = RingBuffer::create(config.capacity)?;
    let clock = MonotonicClock::new()?;
    let stats = StressStats::new();
    let chunk = config.chunk.max(1);
    let total = config.total_bytes;

    info!(
        "stress start: capacity={} total={} chunk={}",
        config.capacity, total, chunk
    );

    let start = clock.now()?;
    {
        let (mut producer, mut consumer) = ring.split();
        let stats = &stats;

        thread::scope(|s| {
            s.spawn(move || {
                let mut buf = vec![0u8; chunk];
                let mut offset = 0u64;
                while offset < total {
                    let want = chunk.min((total - offset) as usize);
                    for (i, b) in buf[..want].iter_mut().enumerate() {
                        *b = pattern(offset + i as u64);
                    }
                    let mut sent = 0;
                    while sent < want {
                        let n = producer.put(&buf[sent..want]);
                        if n < want - sent {
                            stats.short_writes.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        sent += n;
                    }
                    offset += want as u64;
                    stats.bytes_written.fetch_add(want as u64, Ordering::Relaxed);
                }
                debug!("producer done");
            });

            s.spawn(move || {
                let mut buf = vec![0u8; chunk];
                let mut offset = 0u64;
                while offset < total {
                    let n = consumer.get(&mut buf);
                    if n < chunk && offset + (n as u64) < total {
                        stats.short_reads.fetch_add(1, Ordering::Relaxed);
                    }
                    for &b in &buf[..n] {
                        if b != pattern(offset) {
                            stats.order_errors.fetch_add(1, Ordering::Relaxed);
                        }
                        offset += 1;
                    }
                    stats.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
                    if n == 0 {
                        thread::yield_now();
                    }
                }
                debug!("consumer done");
            });
        });
    }
    let elapsed = clock.now()?.saturating_sub(start);

    if config.verbose {
        println!("Ring after run: {:?}", ring);
        println!("Clock resolution: {} ns", clock.resolution());
    }

    stats.print_report(elapsed);
    Ok(stats)
}

fn main() {
    env_logger::init();
    let config = StressConfig::parse();

    println!("🚀 osiring SPSC stress");
    println!("======================");

    match run_stress(&config) {
        Ok(stats) if stats.passed() => {}
        Ok(_) => process::exit(2),
        Err(e) => {
            eprintln!("❌ Stress error: {}", e);
            process::exit(1);
        }
    }
}
