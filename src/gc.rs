//! Concatenation backed by a reclaiming heap.
//!
//! Buffers handed out by a [`GcHeap`] are shared [`GcBytes`] handles. The
//! caller never frees them: storage is released when the last handle is
//! dropped, and the heap drops its record of the buffer at the next
//! collection. The heap only ever tracks buffers through weak references,
//! so it never keeps one alive.
//!
//! A process-wide heap is created on first use. [`init`] and [`init_with`]
//! may be called any number of times from any thread; only the first
//! initialization takes effect.
//!
//! # Example
//!
//! ```
//! use strconcat::gc;
//!
//! let joined = gc::concat(Some(b"hello\0"), Some(b"world\0")).unwrap();
//! assert_eq!(&*joined, b"helloworld\0");
//!
//! let copy = joined.clone();
//! drop(joined);
//! assert_eq!(copy.content(), b"helloworld");
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::concat::{fill_terminated, operands, terminated_len};
use crate::error::ConcatError;
use crate::str::strlen;

/// Default number of registrations between automatic collections.
pub const DEFAULT_COLLECT_THRESHOLD: usize = 64;

/// Configuration for a [`GcHeap`].
///
/// # Example
///
/// ```
/// use strconcat::gc::GcConfig;
///
/// let config = GcConfig::default()
///     .with_max_bytes(1 << 20)
///     .with_collect_threshold(16);
/// assert_eq!(config.max_bytes(), Some(1 << 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcConfig {
    /// Cap on bytes tracked or reserved by the heap.
    max_bytes: Option<usize>,

    /// Registrations between automatic collections.
    collect_threshold: usize,
}

impl GcConfig {
    /// An unbounded heap with the default collection threshold.
    pub const fn new() -> Self {
        Self {
            max_bytes: None,
            collect_threshold: DEFAULT_COLLECT_THRESHOLD,
        }
    }

    /// Refuse allocations that would take the heap past `max_bytes`.
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Remove the byte cap.
    pub const fn unbounded(mut self) -> Self {
        self.max_bytes = None;
        self
    }

    /// Collect after at least `threshold` registrations. Zero is treated as one.
    ///
    /// The interval grows to twice the number of buffers that survived the
    /// previous pass, so holding many buffers does not make passes frequent.
    pub const fn with_collect_threshold(mut self, threshold: usize) -> Self {
        self.collect_threshold = if threshold == 0 { 1 } else { threshold };
        self
    }

    /// The byte cap, if any.
    pub const fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Minimum registrations between automatic collections.
    pub const fn collect_threshold(&self) -> usize {
        self.collect_threshold
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of heap occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Buffers currently tracked, including unreachable ones not yet collected.
    /// Empty buffers are never tracked.
    pub live_objects: usize,
    /// Bytes held by tracked buffers.
    pub live_bytes: usize,
    /// Bytes handed out in regions that are not frozen yet.
    pub reserved_bytes: usize,
    /// Completed collection passes.
    pub collections: u64,
    /// Buffers forgotten by all collections so far.
    pub reclaimed_objects: u64,
}

/// A shared, immutable buffer owned by a reclaiming heap.
///
/// Cloning is cheap and yields another handle to the same storage.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GcBytes(Arc<Vec<u8>>);

impl GcBytes {
    /// The whole buffer, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The bytes before the first null byte.
    pub fn content(&self) -> &[u8] {
        crate::str::content(&self.0)
    }

    /// Number of live handles to this buffer.
    pub fn handle_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }

    /// True if both handles refer to the same storage.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

impl Deref for GcBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for GcBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for GcBytes {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl fmt::Debug for GcBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcBytes")
            .field(&self.content().escape_ascii().to_string())
            .finish()
    }
}

/// A zeroed, writable region from a [`GcHeap`].
///
/// The region counts against the heap's budget until it is either frozen
/// into a [`GcBytes`] or dropped.
pub struct GcRegion<'h> {
    heap: &'h GcHeap,
    buf: Vec<u8>,
}

impl GcRegion<'_> {
    /// Hand the region over to the heap and return a shared handle to it.
    pub fn freeze(mut self) -> GcBytes {
        let buf = std::mem::take(&mut self.buf);
        self.heap.register(buf)
    }
}

impl Deref for GcRegion<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for GcRegion<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for GcRegion<'_> {
    fn drop(&mut self) {
        // Frozen regions leave an empty buffer behind.
        if !self.buf.is_empty() {
            self.heap.release(self.buf.len());
        }
    }
}

impl fmt::Debug for GcRegion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcRegion")
            .field("len", &self.buf.len())
            .finish()
    }
}

struct Tracked {
    handle: Weak<Vec<u8>>,
    len: usize,
}

struct Roots {
    tracked: Vec<Tracked>,
    live_bytes: usize,
    reserved_bytes: usize,
    since_collect: usize,
    // Registrations before the next automatic pass: the configured
    // threshold or twice the last pass's survivors, whichever is larger.
    trigger: usize,
    threshold: usize,
    collections: u64,
    reclaimed: u64,
}

impl Roots {
    fn new(threshold: usize) -> Self {
        Self {
            tracked: Vec::new(),
            live_bytes: 0,
            reserved_bytes: 0,
            since_collect: 0,
            trigger: threshold,
            threshold,
            collections: 0,
            reclaimed: 0,
        }
    }

    fn fits(&self, size: usize, max: usize) -> bool {
        self.live_bytes
            .checked_add(self.reserved_bytes)
            .and_then(|used| used.checked_add(size))
            .is_some_and(|total| total <= max)
    }

    fn collect(&mut self) -> usize {
        let before = self.tracked.len();
        let mut freed = 0usize;
        self.tracked.retain(|t| {
            let alive = t.handle.strong_count() > 0;
            if !alive {
                freed += t.len;
            }
            alive
        });

        let reclaimed = before - self.tracked.len();
        self.live_bytes -= freed;
        self.since_collect = 0;
        self.trigger = self.threshold.max(self.tracked.len().saturating_mul(2));
        self.collections += 1;
        self.reclaimed += reclaimed as u64;
        reclaimed
    }
}

/// A reclaiming heap for byte buffers.
pub struct GcHeap {
    config: GcConfig,
    roots: Mutex<Roots>,
}

static GLOBAL: OnceLock<GcHeap> = OnceLock::new();

impl GcHeap {
    /// Create a standalone heap.
    pub fn new(config: GcConfig) -> Self {
        Self {
            config,
            roots: Mutex::new(Roots::new(config.collect_threshold)),
        }
    }

    /// The process-wide heap, created with the default configuration if
    /// nothing initialized it yet.
    pub fn global() -> &'static GcHeap {
        GLOBAL.get_or_init(|| GcHeap::new(GcConfig::default()))
    }

    /// This heap's configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Roots> {
        // No panic point sits between paired updates, so poisoned roots are intact.
        self.roots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reserve(&self, size: usize) -> Result<(), ConcatError> {
        let mut roots = self.lock();
        if let Some(max) = self.config.max_bytes {
            if !roots.fits(size, max) {
                roots.collect();
                if !roots.fits(size, max) {
                    return Err(ConcatError::over_budget(size));
                }
            }
        }
        roots.reserved_bytes = roots
            .reserved_bytes
            .checked_add(size)
            .ok_or_else(|| ConcatError::over_budget(size))?;
        Ok(())
    }

    fn release(&self, size: usize) {
        let mut roots = self.lock();
        roots.reserved_bytes -= size;
    }

    fn register(&self, buf: Vec<u8>) -> GcBytes {
        let len = buf.len();
        let bytes = GcBytes(Arc::new(buf));
        // Empty buffers hold no heap bytes; there is nothing to reclaim.
        if len == 0 {
            return bytes;
        }

        let mut roots = self.lock();
        roots.reserved_bytes -= len;
        roots.live_bytes += len;
        roots.tracked.push(Tracked {
            handle: Arc::downgrade(&bytes.0),
            len,
        });
        roots.since_collect += 1;
        if roots.since_collect >= roots.trigger {
            roots.collect();
        }

        bytes
    }

    /// Allocate a zeroed region of exactly `size` bytes.
    ///
    /// Fails when the heap's byte cap would be exceeded even after a
    /// collection, or when the system allocator refuses the request.
    pub fn try_alloc(&self, size: usize) -> Result<GcRegion<'_>, ConcatError> {
        self.reserve(size)?;

        let mut buf = Vec::new();
        if let Err(e) = buf.try_reserve_exact(size) {
            self.release(size);
            return Err(ConcatError::alloc_failed(size, e));
        }
        buf.resize(size, 0);

        Ok(GcRegion { heap: self, buf })
    }

    /// Like [`GcHeap::try_alloc`], returning `None` on failure.
    pub fn alloc(&self, size: usize) -> Option<GcRegion<'_>> {
        self.try_alloc(size).ok()
    }

    /// Concatenate two byte strings into a buffer owned by this heap.
    pub fn try_concat(
        &self,
        str1: Option<&[u8]>,
        str2: Option<&[u8]>,
    ) -> Result<GcBytes, ConcatError> {
        let (a, b) = operands(str1, str2)?;
        let len1 = strlen(a);
        let len2 = strlen(b);
        let total = terminated_len(len1, len2)?;

        let mut region = self.try_alloc(total)?;
        fill_terminated(&mut region, &a[..len1], &b[..len2]);
        Ok(region.freeze())
    }

    /// Like [`GcHeap::try_concat`], returning `None` on failure.
    pub fn concat(&self, str1: Option<&[u8]>, str2: Option<&[u8]>) -> Option<GcBytes> {
        self.try_concat(str1, str2).ok()
    }

    /// Forget every buffer that has no live handle left.
    ///
    /// Returns the number of buffers reclaimed by this pass.
    pub fn collect(&self) -> usize {
        self.lock().collect()
    }

    /// Current occupancy.
    pub fn stats(&self) -> GcStats {
        let roots = self.lock();
        GcStats {
            live_objects: roots.tracked.len(),
            live_bytes: roots.live_bytes,
            reserved_bytes: roots.reserved_bytes,
            collections: roots.collections,
            reclaimed_objects: roots.reclaimed,
        }
    }
}

impl fmt::Debug for GcHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcHeap")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Initialize the process-wide heap with the default configuration.
///
/// Returns `true` if this call performed the initialization.
pub fn init() -> bool {
    init_with(GcConfig::default())
}

/// Initialize the process-wide heap with `config`.
///
/// Returns `true` if this call performed the initialization; later calls
/// leave the existing heap untouched and return `false`.
pub fn init_with(config: GcConfig) -> bool {
    let mut fresh = false;
    GLOBAL.get_or_init(|| {
        fresh = true;
        GcHeap::new(config)
    });
    fresh
}

/// True once the process-wide heap exists.
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// Allocate a zeroed `size`-byte region from the process-wide heap.
pub fn gc_alloc(size: usize) -> Option<GcRegion<'static>> {
    GcHeap::global().alloc(size)
}

/// Concatenate into a buffer owned by the process-wide heap.
///
/// Returns `None` if either input is absent or the heap cannot satisfy
/// the allocation.
pub fn concat(str1: Option<&[u8]>, str2: Option<&[u8]>) -> Option<GcBytes> {
    GcHeap::global().concat(str1, str2)
}

/// Like [`concat`], but reports why the result is absent.
pub fn try_concat(str1: Option<&[u8]>, str2: Option<&[u8]>) -> Result<GcBytes, ConcatError> {
    GcHeap::global().try_concat(str1, str2)
}

/// Run a collection on the process-wide heap.
pub fn collect() -> usize {
    GcHeap::global().collect()
}

/// Occupancy of the process-wide heap.
pub fn stats() -> GcStats {
    GcHeap::global().stats()
}
