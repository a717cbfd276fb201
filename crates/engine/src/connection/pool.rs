use std::cell::RefCell;
use std::mem;
use std::ops::{Deref, DerefMut};

use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};
use tracing::trace;

use crate::connection::{Pipeline, PipelineConfig};

/// Ceiling used when the memory based sizing is unavailable.
pub const FALLBACK_CAPACITY: usize = 1024;

/// Stack size assumed when `RLIMIT_STACK` is unlimited.
const DEFAULT_STACK_LIMIT: u64 = 8 * 1024 * 1024;

/// Supplies and reclaims pipeline instances.
///
/// Instances are created lazily, up to a hard ceiling, and recycled
/// afterwards: a released instance keeps its buffer capacity. When every
/// instance is bound, [`acquire`](Self::acquire) waits for one to be
/// released.
///
/// The pool lives on a single thread; the free list is a plain
/// `RefCell<Vec<_>>`.
#[derive(Debug)]
pub struct PipelinePool {
    free: RefCell<Vec<Pipeline>>,
    permits: Semaphore,
    capacity: usize,
    config: PipelineConfig,
}

impl PipelinePool {
    pub fn new(capacity: usize, config: PipelineConfig) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self { free: RefCell::new(Vec::new()), permits: Semaphore::new(capacity), capacity, config }
    }

    /// A pool whose ceiling is derived from physical memory, see [`system_capacity`].
    pub fn with_system_capacity(config: PipelineConfig) -> Self {
        Self::new(system_capacity(), config)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Instances that can be handed out without waiting.
    #[inline]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Instances created so far and currently sitting in the free list.
    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }

    /// Hands out an instance with empty buffers, waiting while the pool is
    /// exhausted. The instance returns to the pool when the guard is dropped.
    pub async fn acquire(&self) -> Result<PooledPipeline<'_>, AcquireError> {
        let permit = self.permits.acquire().await?;

        let pipeline = self.free.borrow_mut().pop().unwrap_or_else(|| {
            trace!(in_use = self.capacity - self.available(), "creating pipeline instance");
            Pipeline::new(self.config)
        });

        Ok(PooledPipeline { pool: self, pipeline, _permit: permit })
    }

    fn release(&self, mut pipeline: Pipeline) {
        pipeline.reset();
        self.free.borrow_mut().push(pipeline);
    }
}

/// A pipeline instance on loan from a [`PipelinePool`].
#[derive(Debug)]
pub struct PooledPipeline<'a> {
    pool: &'a PipelinePool,
    pipeline: Pipeline,
    // dropped after the instance is back in the free list
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledPipeline<'_> {
    type Target = Pipeline;

    fn deref(&self) -> &Self::Target {
        &self.pipeline
    }
}

impl DerefMut for PooledPipeline<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pipeline
    }
}

impl Drop for PooledPipeline<'_> {
    fn drop(&mut self) {
        self.pool.release(mem::take(&mut self.pipeline));
    }
}

/// How many pipeline instances the machine can back: physical memory
/// divided by the per-task stack limit, halved to avoid over-commit.
///
/// Falls back to [`FALLBACK_CAPACITY`] when either figure is unavailable.
pub fn system_capacity() -> usize {
    memory_capacity().filter(|capacity| *capacity > 0).unwrap_or(FALLBACK_CAPACITY)
}

#[cfg(unix)]
fn memory_capacity() -> Option<usize> {
    let mut limit = libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    // SAFETY: `limit` is a valid, writable rlimit for the duration of the call
    if unsafe { libc::getrlimit(libc::RLIMIT_STACK, &raw mut limit) } != 0 {
        return None;
    }
    let stack = if limit.rlim_cur == libc::RLIM_INFINITY { DEFAULT_STACK_LIMIT } else { u64::try_from(limit.rlim_cur).ok()? };

    // SAFETY: sysconf only reads a system constant
    let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    // SAFETY: sysconf only reads a system constant
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    let memory = u64::try_from(pages).ok()?.checked_mul(u64::try_from(page_size).ok()?)?;
    usize::try_from(memory / stack.max(1) / 2).ok()
}

#[cfg(not(unix))]
fn memory_capacity() -> Option<usize> {
    None
}
