//! Lock-Free Single-Producer Single-Consumer (SPSC) Byte Ring Buffer
//!
//! Backing store berukuran `capacity + 1` byte. Satu slot selalu dikosongkan
//! (reserved slot) supaya kondisi "penuh" dan "kosong" bisa dibedakan hanya
//! dari dua cursor, tanpa counter terpisah:
//! - kosong: `head == tail`
//! - penuh:  `(head + 1) % size == tail`
//!
//! Producer hanya menulis `head`, consumer hanya menulis `tail`.
//! Cursor sendiri di-load Relaxed, cursor lawan di-load Acquire, dan update
//! cursor sendiri di-store Release. Tidak ada Mutex, tidak ada alokasi
//! setelah `create`.

use std::cell::UnsafeCell;
use std::fmt;
use std::io;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, warn};

use super::error::{RingError, RingResult};

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Fixed-capacity circular byte queue.
///
/// Untuk pemakaian single-thread, pakai `put`/`get` langsung (butuh `&mut self`).
/// Untuk dua thread, pecah dulu dengan [`RingBuffer::split`] menjadi satu
/// [`Producer`] dan satu [`Consumer`].
#[repr(C)]
pub struct RingBuffer {
    // Producer side - cache line aligned
    head: CacheLinePadded<AtomicUsize>,
    // Consumer side - cache line aligned
    tail: CacheLinePadded<AtomicUsize>,
    // Panjang = capacity + 1, termasuk reserved slot
    storage: Box<[UnsafeCell<u8>]>,
    capacity: usize,
}

// SAFETY: RingBuffer aman di-share antar thread karena:
// - Hanya satu Producer (menulis head, menulis region kosong)
// - Hanya satu Consumer (menulis tail, membaca region terisi)
// - Kedua handle hanya bisa didapat lewat `split(&mut self)`
// - Release/Acquire pada cursor menjamin visibility isi storage
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Membuat ring buffer dengan kapasitas pakai `capacity` byte.
    ///
    /// Alokasi hanya terjadi sekali di sini (`capacity + 1` byte).
    /// Kegagalan alokasi dikembalikan sebagai [`RingError::AllocationFailed`],
    /// bukan abort; caller yang menentukan kebijakan terminasi.
    ///
    /// `capacity == 0` valid: `put` dan `get` selalu memindahkan 0 byte.
    pub fn create(capacity: usize) -> RingResult<Self> {
        let size = capacity
            .checked_add(1)
            .ok_or(RingError::CapacityOverflow { capacity })?;

        let mut storage: Vec<UnsafeCell<u8>> = Vec::new();
        if storage.try_reserve_exact(size).is_err() {
            warn!("ring buffer allocation of {} bytes failed", size);
            return Err(RingError::AllocationFailed { size });
        }
        // Tidak realokasi: kapasitas sudah di-reserve
        storage.resize_with(size, || UnsafeCell::new(0));

        debug!("ring buffer created: capacity={} storage={}", capacity, size);

        Ok(Self {
            head: CacheLinePadded::new(AtomicUsize::new(0)),
            tail: CacheLinePadded::new(AtomicUsize::new(0)),
            storage: storage.into_boxed_slice(),
            capacity,
        })
    }

    /// Pecah ring menjadi satu producer dan satu consumer.
    ///
    /// Ring di-borrow mutable selama handle hidup, jadi `reset` dan drop
    /// tidak mungkin berjalan bersamaan dengan `put`/`get`.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &RingBuffer = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Tulis sebanyak mungkin byte dari `src`. Returns jumlah yang tertulis.
    #[inline]
    pub fn put(&mut self, src: &[u8]) -> usize {
        // SAFETY: `&mut self` berarti tidak ada producer/consumer lain
        unsafe { self.put_unchecked(src) }
    }

    /// Baca sebanyak mungkin byte ke `dst`. Returns jumlah yang terbaca.
    #[inline]
    pub fn get(&mut self, dst: &mut [u8]) -> usize {
        // SAFETY: `&mut self` berarti tidak ada producer/consumer lain
        unsafe { self.get_unchecked(dst) }
    }

    /// Kosongkan buffer. Semua byte yang belum dibaca dibuang.
    pub fn reset(&mut self) {
        *self.head.value.get_mut() = 0;
        *self.tail.value.get_mut() = 0;
    }

    /// Jumlah byte yang masih bisa ditulis
    #[inline]
    pub fn free_bytes(&self) -> usize {
        let (head, tail) = self.cursors();
        free_between(head, tail, self.storage.len())
    }

    /// Jumlah byte yang siap dibaca
    #[inline]
    pub fn used_bytes(&self) -> usize {
        let (head, tail) = self.cursors();
        used_between(head, tail, self.storage.len())
    }

    /// Kapasitas pakai (tanpa reserved slot). Konstan seumur buffer.
    #[inline]
    pub const fn size(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let (head, tail) = self.cursors();
        head == tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.used_bytes() == self.capacity
    }

    #[inline(always)]
    fn cursors(&self) -> (usize, usize) {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        (head, tail)
    }

    #[inline(always)]
    fn storage_ptr(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.storage.as_ptr())
    }

    /// Producer path.
    ///
    /// # Safety
    /// Caller harus satu-satunya producer yang aktif.
    unsafe fn put_unchecked(&self, src: &[u8]) -> usize {
        let size = self.storage.len();
        let head = self.head.value.load(Ordering::Relaxed);
        let tail = self.tail.value.load(Ordering::Acquire);
        let base = self.storage_ptr();
        let requested = src.len();

        // SAFETY (semua copy di bawah): region [head, ...) yang ditulis selalu
        // berada di area kosong, yang tidak disentuh consumer sampai head
        // di-publish.
        let (copied, next_head) = if head < tail {
            // Satu run: head .. tail-1
            let n = requested.min(tail - head - 1);
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(head), n);
            (n, head + n)
        } else if tail == 0 {
            // Tidak boleh wrap: index 0 masih milik tail
            let n = requested.min(size - head - 1);
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(head), n);
            (n, head + n)
        } else {
            let first = requested.min(size - head);
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(head), first);
            if head + first == size {
                // Wraparound ke index 0, berhenti satu slot sebelum tail
                let second = (requested - first).min(tail - 1);
                ptr::copy_nonoverlapping(src.as_ptr().add(first), base, second);
                (first + second, second)
            } else {
                (first, head + first)
            }
        };

        // Release: isi storage visible sebelum head baru terlihat consumer
        self.head.value.store(next_head, Ordering::Release);
        copied
    }

    /// Consumer path.
    ///
    /// # Safety
    /// Caller harus satu-satunya consumer yang aktif.
    unsafe fn get_unchecked(&self, dst: &mut [u8]) -> usize {
        let size = self.storage.len();
        let tail = self.tail.value.load(Ordering::Relaxed);
        let head = self.head.value.load(Ordering::Acquire);
        let base = self.storage_ptr() as *const u8;
        let requested = dst.len();

        // SAFETY (semua copy di bawah): region yang dibaca sudah di-publish
        // producer lewat Release store pada head.
        let (copied, next_tail) = if tail <= head {
            let n = requested.min(head - tail);
            ptr::copy_nonoverlapping(base.add(tail), dst.as_mut_ptr(), n);
            (n, tail + n)
        } else {
            let first = requested.min(size - tail);
            ptr::copy_nonoverlapping(base.add(tail), dst.as_mut_ptr(), first);
            if tail + first == size {
                let second = (requested - first).min(head);
                ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), second);
                (first + second, second)
            } else {
                (first, tail + first)
            }
        };

        // Release: read di atas selesai sebelum slot dikembalikan ke producer
        self.tail.value.store(next_tail, Ordering::Release);
        copied
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, tail) = self.cursors();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("head", &head)
            .field("tail", &tail)
            .field("used", &used_between(head, tail, self.storage.len()))
            .finish()
    }
}

#[inline(always)]
fn used_between(head: usize, tail: usize, size: usize) -> usize {
    if head >= tail {
        head - tail
    } else {
        head + size - tail
    }
}

#[inline(always)]
fn free_between(head: usize, tail: usize, size: usize) -> usize {
    if tail > head {
        tail - head - 1
    } else {
        tail + size - head - 1
    }
}

/// Write handle. Hanya ada satu per `split`.
pub struct Producer<'a> {
    ring: &'a RingBuffer,
}

impl Producer<'_> {
    /// Tulis sebanyak mungkin byte dari `src` (short write kalau ruang kurang).
    /// Zero-allocation, lock-free, tidak pernah block.
    #[inline]
    pub fn put(&mut self, src: &[u8]) -> usize {
        // SAFETY: Producer tidak Clone dan hanya dibuat sekali per split
        unsafe { self.ring.put_unchecked(src) }
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.ring.free_bytes()
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.ring.used_bytes()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.ring.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

/// `write` tidak pernah block: buffer penuh menghasilkan `WouldBlock`.
impl io::Write for Producer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.put(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read handle. Hanya ada satu per `split`.
pub struct Consumer<'a> {
    ring: &'a RingBuffer,
}

impl Consumer<'_> {
    /// Baca sebanyak mungkin byte ke `dst` (short read kalau data kurang).
    /// Zero-allocation, lock-free, tidak pernah block.
    #[inline]
    pub fn get(&mut self, dst: &mut [u8]) -> usize {
        // SAFETY: Consumer tidak Clone dan hanya dibuat sekali per split
        unsafe { self.ring.get_unchecked(dst) }
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.ring.free_bytes()
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.ring.used_bytes()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.ring.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

/// `read` tidak pernah block: buffer kosong menghasilkan `WouldBlock`,
/// bukan `Ok(0)` (yang berarti EOF).
impl io::Read for Consumer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.get(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn assert_accounting(rb: &RingBuffer) {
        assert_eq!(rb.used_bytes() + rb.free_bytes(), rb.size());
    }

    #[test]
    fn test_create_is_empty() {
        for capacity in [0usize, 1, 2, 7, 64, 4096] {
            let rb = RingBuffer::create(capacity).unwrap();
            assert!(rb.is_empty());
            assert_eq!(rb.is_full(), capacity == 0);
            assert_eq!(rb.used_bytes(), 0);
            assert_eq!(rb.free_bytes(), capacity);
            assert_eq!(rb.size(), capacity);
        }
    }

    #[test]
    fn test_zero_capacity_never_transfers() {
        let mut rb = RingBuffer::create(0).unwrap();
        assert_eq!(rb.put(b"abc"), 0);
        let mut out = [0u8; 3];
        assert_eq!(rb.get(&mut out), 0);
        assert!(rb.is_empty());
        assert!(rb.is_full());
    }

    #[test]
    fn test_capacity_overflow() {
        assert_eq!(
            RingBuffer::create(usize::MAX).unwrap_err(),
            RingError::CapacityOverflow {
                capacity: usize::MAX
            }
        );
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let capacity = isize::MAX as usize;
        assert_eq!(
            RingBuffer::create(capacity).unwrap_err(),
            RingError::AllocationFailed {
                size: capacity + 1
            }
        );
    }

    #[test]
    fn test_basic_put_get() {
        let mut rb = RingBuffer::create(16).unwrap();

        assert_eq!(rb.put(b"hello"), 5);
        assert!(!rb.is_empty());
        assert_eq!(rb.used_bytes(), 5);
        assert_accounting(&rb);

        let mut out = [0u8; 5];
        assert_eq!(rb.get(&mut out), 5);
        assert_eq!(&out, b"hello");
        assert!(rb.is_empty());
        assert_accounting(&rb);
    }

    #[test]
    fn test_fill_exactly_to_capacity() {
        let mut rb = RingBuffer::create(8).unwrap();
        assert_eq!(rb.put(&[7u8; 8]), 8);
        assert!(rb.is_full());
        assert_eq!(rb.free_bytes(), 0);
        assert_eq!(rb.put(b"x"), 0);
    }

    #[test]
    fn test_wraparound_sequence() {
        let mut rb = RingBuffer::create(4).unwrap();

        assert_eq!(rb.put(b"abc"), 3);
        let mut two = [0u8; 2];
        assert_eq!(rb.get(&mut two), 2);
        assert_eq!(&two, b"ab");

        // free = 3: d,e di index 3,4 lalu f wrap ke index 0
        assert_eq!(rb.free_bytes(), 3);
        assert_eq!(rb.put(b"def"), 3);
        assert!(rb.is_full());
        assert_accounting(&rb);

        let mut four = [0u8; 4];
        assert_eq!(rb.get(&mut four), 4);
        assert_eq!(&four, b"cdef");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_short_write() {
        let mut rb = RingBuffer::create(10).unwrap();
        assert_eq!(rb.put(&[1u8; 6]), 6);
        let k = rb.free_bytes();
        assert_eq!(k, 4);
        assert_eq!(rb.put(&[2u8; 9]), k);
        assert!(rb.is_full());
    }

    #[test]
    fn test_short_write_across_wrap() {
        let mut rb = RingBuffer::create(6).unwrap();
        assert_eq!(rb.put(&[0u8; 5]), 5);
        let mut sink = [0u8; 3];
        assert_eq!(rb.get(&mut sink), 3);

        // head=5, tail=3: 2 byte sampai ujung, lalu 2 byte dari index 0
        let k = rb.free_bytes();
        assert_eq!(k, 4);
        assert_eq!(rb.put(&[9u8; 10]), k);
        assert!(rb.is_full());
        assert_accounting(&rb);
    }

    #[test]
    fn test_short_read() {
        let mut rb = RingBuffer::create(10).unwrap();
        assert_eq!(rb.put(b"xyz"), 3);
        let mut out = [0u8; 8];
        assert_eq!(rb.get(&mut out), 3);
        assert_eq!(&out[..3], b"xyz");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_short_read_across_wrap() {
        let mut rb = RingBuffer::create(5).unwrap();
        assert_eq!(rb.put(b"abcd"), 4);
        let mut out = [0u8; 3];
        assert_eq!(rb.get(&mut out), 3);
        assert_eq!(rb.put(b"efg"), 3);

        let mut all = [0u8; 16];
        assert_eq!(rb.get(&mut all), 4);
        assert_eq!(&all[..4], b"defg");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_get_stops_at_physical_end() {
        let mut rb = RingBuffer::create(4).unwrap();
        assert_eq!(rb.put(b"abcd"), 4);
        let mut out = [0u8; 3];
        assert_eq!(rb.get(&mut out), 3);
        assert_eq!(rb.put(b"ef"), 2);

        // tail=3 > head=1: minta 1 byte saja, tidak sampai ujung
        let mut one = [0u8; 1];
        assert_eq!(rb.get(&mut one), 1);
        assert_eq!(&one, b"d");
        assert_eq!(rb.used_bytes(), 2);
    }

    #[test]
    fn test_put_exactly_to_physical_end() {
        let mut rb = RingBuffer::create(4).unwrap();
        assert_eq!(rb.put(b"ab"), 2);
        let mut out = [0u8; 2];
        assert_eq!(rb.get(&mut out), 2);

        // head=2, tail=2: run pertama tepat sampai ujung, fase kedua 0 byte, head=0
        assert_eq!(rb.put(b"cde"), 3);
        assert_eq!(rb.used_bytes(), 3);
        assert_eq!(rb.put(b"f"), 1);
        assert!(rb.is_full());

        let mut all = [0u8; 4];
        assert_eq!(rb.get(&mut all), 4);
        assert_eq!(&all, b"cdef");
    }

    #[test]
    fn test_many_rounds_preserve_order() {
        let mut rb = RingBuffer::create(7).unwrap();
        let mut next_in = 0u8;
        let mut next_out = 0u8;

        for round in 0..200usize {
            let chunk: Vec<u8> = (0..(round % 6 + 1))
                .map(|i| next_in.wrapping_add(i as u8))
                .collect();
            let written = rb.put(&chunk);
            next_in = next_in.wrapping_add(written as u8);
            assert_accounting(&rb);

            let mut out = vec![0u8; round % 5 + 1];
            let read = rb.get(&mut out);
            for &b in &out[..read] {
                assert_eq!(b, next_out);
                next_out = next_out.wrapping_add(1);
            }
            assert_accounting(&rb);
        }
    }

    #[test]
    fn test_reset() {
        let mut rb = RingBuffer::create(4).unwrap();
        rb.put(b"abc");
        let mut out = [0u8; 2];
        rb.get(&mut out);
        rb.put(b"de");

        rb.reset();
        assert!(rb.is_empty());
        assert_eq!(rb.used_bytes(), 0);
        assert_eq!(rb.free_bytes(), 4);

        assert_eq!(rb.put(b"wxyz"), 4);
        let mut all = [0u8; 4];
        assert_eq!(rb.get(&mut all), 4);
        assert_eq!(&all, b"wxyz");
    }

    #[test]
    fn test_queries_are_idempotent() {
        let mut rb = RingBuffer::create(9).unwrap();
        rb.put(b"12345");
        let snapshot = (rb.free_bytes(), rb.used_bytes(), rb.is_empty(), rb.is_full());
        for _ in 0..10 {
            assert_eq!(
                (rb.free_bytes(), rb.used_bytes(), rb.is_empty(), rb.is_full()),
                snapshot
            );
        }
    }

    #[test]
    fn test_split_handles() {
        let mut rb = RingBuffer::create(8).unwrap();
        {
            let (mut producer, mut consumer) = rb.split();
            assert_eq!(producer.put(b"ring"), 4);
            assert_eq!(consumer.used_bytes(), 4);
            assert_eq!(producer.free_bytes(), 4);

            let mut out = [0u8; 4];
            assert_eq!(consumer.get(&mut out), 4);
            assert_eq!(&out, b"ring");
            assert!(consumer.is_empty());
            assert_eq!(producer.size(), 8);
        }
        rb.reset();
        assert!(rb.is_empty());
    }

    #[test]
    fn test_io_would_block() {
        let mut rb = RingBuffer::create(3).unwrap();
        let (mut producer, mut consumer) = rb.split();

        let mut out = [0u8; 4];
        let err = consumer.read(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        assert_eq!(producer.write(b"abcd").unwrap(), 3);
        let err = producer.write(b"e").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        producer.flush().unwrap();

        assert_eq!(consumer.read(&mut out).unwrap(), 3);
        assert_eq!(&out[..3], b"abc");
        assert_eq!(producer.write(&[]).unwrap(), 0);
    }

    #[test]
    fn test_debug_output() {
        let mut rb = RingBuffer::create(4).unwrap();
        rb.put(b"ab");
        let text = format!("{:?}", rb);
        assert!(text.contains("capacity: 4"));
        assert!(text.contains("used: 2"));
    }
}
