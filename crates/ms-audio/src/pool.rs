//! Bounded pool of reusable sample buffers.
//!
//! One mutex guards the in-use / available sets and the running size; the
//! counters are atomics so `stats()` readers never contend with the capture
//! thread for long. Invariant after every operation:
//! `current_size == Σ size(in_use ∪ available) <= max_size`.
//!
//! A `PooledBuffer` keeps a weak link to its pool and goes back to
//! `available` when dropped, so a lost handle (unwinding thread, channel torn
//! down with buffers queued) never pins its bytes in `in_use`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

use ms_core::config::PoolConfig;
use ms_core::frame::AudioFormat;
use ms_core::traits::{MemoryPressure, PressureResponder};

/// Process-wide id source: ids never repeat, even across pools.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which pool set a buffer currently belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferState {
    /// Handed out, owned by a caller.
    InUse,
    /// Parked in the pool, ready for reuse.
    Available,
}

/// A buffer handed out by the pool. Owns its storage until released or
/// dropped; both paths return it to the pool that issued it.
///
/// Equality is identity: two distinct allocations never compare equal,
/// whatever they contain.
#[derive(Debug)]
pub struct PooledBuffer {
    id: BufferId,
    format: AudioFormat,
    frame_capacity: usize,
    /// Fill limit in samples (requested frames × channels).
    limit: usize,
    data: Vec<f32>,
    home: Weak<PoolShared>,
}

impl PooledBuffer {
    /// Identity of the underlying allocation.
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Sample format of the buffer.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Allocated capacity in frames (may exceed the requested size on reuse).
    #[must_use]
    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    /// Interleaved samples written so far.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Samples still accepted before the requested frame count is reached.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit - self.data.len()
    }

    /// `true` once the requested frame count has been written.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.limit
    }

    /// Append as many of `samples` as fit; returns how many were taken.
    pub fn fill_from(&mut self, samples: &[f32]) -> usize {
        let take = self.remaining().min(samples.len());
        self.data.extend_from_slice(&samples[..take]);
        take
    }
}

impl PartialEq for PooledBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PooledBuffer {}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.home.upgrade() {
            pool.reclaim(self.id, std::mem::take(&mut self.data), Instant::now());
        }
    }
}

/// The pool's record of one allocation.
#[derive(Debug)]
struct ManagedBuffer {
    id: BufferId,
    format: AudioFormat,
    frame_capacity: usize,
    size_bytes: usize,
    last_used: Instant,
    state: BufferState,
    /// Empty while in use: the storage lives in the `PooledBuffer`.
    storage: Vec<f32>,
}

#[derive(Debug, Default)]
struct PoolState {
    in_use: HashMap<BufferId, ManagedBuffer>,
    available: Vec<ManagedBuffer>,
    current_size: usize,
}

impl PoolState {
    /// Smallest available buffer of `format` holding at least `frames`.
    fn best_fit(&self, format: AudioFormat, frames: usize) -> Option<usize> {
        self.available
            .iter()
            .enumerate()
            .filter(|(_, b)| b.format == format && b.frame_capacity >= frames)
            .min_by_key(|(_, b)| b.frame_capacity)
            .map(|(i, _)| i)
    }

    /// Drop every available buffer matching `pred`. Returns (count, bytes).
    fn evict_where(&mut self, pred: impl Fn(&ManagedBuffer) -> bool) -> (usize, usize) {
        let mut count = 0;
        let mut bytes = 0;
        self.available.retain(|b| {
            if pred(b) {
                count += 1;
                bytes += b.size_bytes;
                false
            } else {
                true
            }
        });
        self.current_size -= bytes;
        (count, bytes)
    }

    /// Evict buffers idle longer than `idle`, oldest first, until the size
    /// drops to `target`.
    fn evict_idle_until(&mut self, now: Instant, idle: Duration, target: usize) -> (usize, usize) {
        self.available.sort_by_key(|b| b.last_used);
        let mut count = 0;
        let mut bytes = 0;
        let mut i = 0;
        while i < self.available.len() && self.current_size > target {
            if now.duration_since(self.available[i].last_used) > idle {
                let b = self.available.remove(i);
                self.current_size -= b.size_bytes;
                count += 1;
                bytes += b.size_bytes;
            } else {
                i += 1;
            }
        }
        (count, bytes)
    }

    fn tracked_size(&self) -> usize {
        self.in_use.values().map(|b| b.size_bytes).sum::<usize>()
            + self.available.iter().map(|b| b.size_bytes).sum::<usize>()
    }
}

/// State shared between the pool and the handles it issued.
struct PoolShared {
    state: Mutex<PoolState>,
}

impl PoolShared {
    /// In-use → available.
    fn reclaim(&self, id: BufferId, storage: Vec<f32>, now: Instant) {
        let mut state = self.lock_state();
        let Some(mut managed) = state.in_use.remove(&id) else {
            drop(state);
            log::error!("Release of untracked buffer {id:?}, ignored");
            return;
        };
        managed.storage = storage;
        managed.last_used = now;
        managed.state = BufferState::Available;
        state.available.push(managed);
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Diagnostic snapshot of a pool. Not load-bearing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoolStats {
    /// Bytes currently tracked (in use + available).
    pub current_size: usize,
    /// Budget, bytes.
    pub max_size: usize,
    /// Buffers handed out.
    pub in_use: usize,
    /// Buffers parked for reuse.
    pub available: usize,
    /// Fresh allocations since creation.
    pub allocations: u64,
    /// Requests served from `available`.
    pub reuse_hits: u64,
    /// Buffers dropped by pressure handling or emergency cleanup.
    pub evictions: u64,
}

impl PoolStats {
    /// Share of served requests that reused a buffer [0.0, 1.0].
    #[must_use]
    pub fn reuse_efficiency(&self) -> f64 {
        let served = self.allocations + self.reuse_hits;
        if served == 0 {
            0.0
        } else {
            self.reuse_hits as f64 / served as f64
        }
    }
}

/// Issues and reclaims sample buffers under a hard memory budget.
///
/// Explicitly constructed and shared as `Arc<BufferPool>`; there is no
/// global instance.
///
/// # Example
/// ```
/// use ms_audio::pool::BufferPool;
/// use ms_core::config::PoolConfig;
/// use ms_core::frame::AudioFormat;
///
/// let pool = BufferPool::new(&PoolConfig::default());
/// let buffer = pool.request(AudioFormat::mono(44100), 1024).unwrap();
/// let id = buffer.id();
/// pool.release(buffer);
/// assert_eq!(pool.request(AudioFormat::mono(44100), 512).unwrap().id(), id);
/// ```
pub struct BufferPool {
    max_size: usize,
    moderate_idle: Duration,
    moderate_target: usize,
    high_idle: Duration,
    shared: Arc<PoolShared>,
    responders: Mutex<Vec<Arc<dyn PressureResponder>>>,
    allocations: AtomicU64,
    reuse_hits: AtomicU64,
    evictions: AtomicU64,
}

impl BufferPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(config: &PoolConfig) -> Self {
        let ratio = f64::from(config.moderate_target_ratio.clamp(0.0, 1.0));
        Self {
            max_size: config.max_bytes,
            moderate_idle: config.moderate_idle(),
            moderate_target: (config.max_bytes as f64 * ratio) as usize,
            high_idle: config.high_idle(),
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState::default()),
            }),
            responders: Mutex::new(Vec::new()),
            allocations: AtomicU64::new(0),
            reuse_hits: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Request a buffer for `frame_capacity` frames of `format`.
    ///
    /// Reuses an available buffer when one fits, otherwise allocates within
    /// the budget. Over budget, every available buffer is evicted and the
    /// allocation retried once. `None` means "skip this frame".
    #[must_use]
    pub fn request(&self, format: AudioFormat, frame_capacity: usize) -> Option<PooledBuffer> {
        self.request_at(format, frame_capacity, Instant::now())
    }

    fn request_at(
        &self,
        format: AudioFormat,
        frame_capacity: usize,
        now: Instant,
    ) -> Option<PooledBuffer> {
        let required = frame_capacity.checked_mul(format.bytes_per_frame())?;
        if required == 0 {
            log::error!("Buffer request with zero size ({frame_capacity} frames, {format:?})");
            return None;
        }
        if required > self.max_size {
            log::warn!(
                "Buffer request of {required} bytes exceeds the pool budget ({} bytes)",
                self.max_size
            );
            return None;
        }
        let limit = frame_capacity * usize::from(format.channels);
        let home = Arc::downgrade(&self.shared);

        let mut state = self.lock_state();

        if let Some(idx) = state.best_fit(format, frame_capacity) {
            let mut managed = state.available.swap_remove(idx);
            managed.last_used = now;
            managed.state = BufferState::InUse;
            let mut data = std::mem::take(&mut managed.storage);
            data.clear();
            let buffer = PooledBuffer {
                id: managed.id,
                format,
                frame_capacity: managed.frame_capacity,
                limit,
                data,
                home,
            };
            state.in_use.insert(managed.id, managed);
            self.reuse_hits.fetch_add(1, Ordering::Relaxed);
            return Some(buffer);
        }

        if state.current_size + required > self.max_size {
            let (count, bytes) = state.evict_where(|_| true);
            self.evictions.fetch_add(count as u64, Ordering::Relaxed);
            if state.current_size + required > self.max_size {
                log::warn!(
                    "Buffer pool exhausted ({} / {} bytes in use), frame skipped",
                    state.current_size,
                    self.max_size
                );
                return None;
            }
            log::warn!("Buffer pool over budget: emergency cleanup freed {count} buffers ({bytes} bytes)");
        }

        let id = BufferId::next();
        state.in_use.insert(
            id,
            ManagedBuffer {
                id,
                format,
                frame_capacity,
                size_bytes: required,
                last_used: now,
                state: BufferState::InUse,
                storage: Vec::new(),
            },
        );
        state.current_size += required;
        self.allocations.fetch_add(1, Ordering::Relaxed);

        Some(PooledBuffer {
            id,
            format,
            frame_capacity,
            limit,
            data: Vec::with_capacity(limit),
            home,
        })
    }

    /// Return a buffer to the available set. Dropping the handle does the
    /// same; this is the explicit form.
    ///
    /// A buffer issued by another pool is a programming error: it is logged
    /// and goes back to the pool that issued it.
    pub fn release(&self, buffer: PooledBuffer) {
        self.release_at(buffer, Instant::now());
    }

    fn release_at(&self, mut buffer: PooledBuffer, now: Instant) {
        if !std::ptr::eq(buffer.home.as_ptr(), Arc::as_ptr(&self.shared)) {
            log::error!("Release of buffer {:?} issued by another pool", buffer.id);
            return;
        }
        // Detach first so the handle's own drop does not reclaim twice.
        buffer.home = Weak::new();
        self.shared.reclaim(buffer.id, std::mem::take(&mut buffer.data), now);
    }

    /// Apply the eviction policy for a memory-pressure event.
    ///
    /// Never touches buffers in use. On `Critical`, registered responders are
    /// notified after the pool lock is released.
    pub fn handle_pressure(&self, level: MemoryPressure) {
        self.handle_pressure_at(level, Instant::now());
    }

    fn handle_pressure_at(&self, level: MemoryPressure, now: Instant) {
        let (count, bytes) = {
            let mut state = self.lock_state();
            match level {
                MemoryPressure::Moderate => {
                    state.evict_idle_until(now, self.moderate_idle, self.moderate_target)
                }
                MemoryPressure::High => {
                    let idle = self.high_idle;
                    state.evict_where(|b| now.duration_since(b.last_used) > idle)
                }
                MemoryPressure::Critical => state.evict_where(|_| true),
            }
        };
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        log::debug!("Memory pressure {level:?}: evicted {count} buffers ({bytes} bytes)");

        if level == MemoryPressure::Critical {
            let responders = self
                .responders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            for responder in responders {
                responder.release_auxiliary(level);
            }
        }
    }

    /// Register a collaborator to notify on critical pressure.
    pub fn add_responder(&self, responder: Arc<dyn PressureResponder>) {
        self.responders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(responder);
    }

    /// Drop every available buffer (teardown). Buffers in use are kept.
    pub fn clear(&self) {
        let (count, _) = self.lock_state().evict_where(|_| true);
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Which set `id` currently belongs to, if any.
    #[must_use]
    pub fn membership(&self, id: BufferId) -> Option<BufferState> {
        let state = self.lock_state();
        if let Some(b) = state.in_use.get(&id) {
            return Some(b.state);
        }
        state.available.iter().find(|b| b.id == id).map(|b| b.state)
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.lock_state();
        PoolStats {
            current_size: state.current_size,
            max_size: self.max_size,
            in_use: state.in_use.len(),
            available: state.available.len(),
            allocations: self.allocations.load(Ordering::Relaxed),
            reuse_hits: self.reuse_hits.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Budget, bytes.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.shared.lock_state()
    }
}

/// Apply memory-pressure events on a dedicated thread, away from the
/// capture callback and the analysis queue. Ends when every sender is dropped.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_pressure_listener(
    pool: Arc<BufferPool>,
    events: flume::Receiver<MemoryPressure>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("ms-pressure".to_string())
        .spawn(move || {
            for level in events.iter() {
                pool.handle_pressure(level);
            }
            log::debug!("Memory pressure listener stopped");
        })
}
