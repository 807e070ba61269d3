//! Buffer allocation for element storage.
//!
//! Every element owns one sample buffer and one user payload buffer. They are
//! requested from a [`BufferAllocator`] when the element is created and handed
//! back when it is freed, so callers can plug in pooling or accounting
//! without the engine knowing about it.

use std::collections::HashMap;

/// Source of zeroed element buffers.
pub trait BufferAllocator {
    /// Allocate a zeroed sample buffer of `len` floats.
    fn alloc(&mut self, len: usize) -> Vec<f32>;

    /// Allocate a zeroed payload buffer of `len` bytes.
    fn alloc_bytes(&mut self, len: usize) -> Vec<u8>;

    /// Return a sample buffer.
    fn free(&mut self, buf: Vec<f32>);

    /// Return a payload buffer.
    fn free_bytes(&mut self, buf: Vec<u8>);

    /// Drop any memory the allocator retains. Called once at teardown.
    fn release(&mut self) {}
}

/// Allocator that goes straight to the global heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    #[inline]
    fn alloc(&mut self, len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    #[inline]
    fn alloc_bytes(&mut self, len: usize) -> Vec<u8> {
        vec![0; len]
    }

    #[inline]
    fn free(&mut self, _buf: Vec<f32>) {}

    #[inline]
    fn free_bytes(&mut self, _buf: Vec<u8>) {}
}

/// Allocator that keeps freed buffers and hands them out again by length.
///
/// Sync passes that recreate elements of the same shape (a face with the
/// same corner count, any vertex or edge) then reuse memory instead of going
/// back to the heap.
#[derive(Debug, Default)]
pub struct PoolAllocator {
    samples: HashMap<usize, Vec<Vec<f32>>>,
    bytes: HashMap<usize, Vec<Vec<u8>>>,
    reused: usize,
}

impl PoolAllocator {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocations served from the pool so far.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Number of buffers currently held by the pool.
    pub fn pooled(&self) -> usize {
        self.samples.values().map(Vec::len).sum::<usize>()
            + self.bytes.values().map(Vec::len).sum::<usize>()
    }
}

impl BufferAllocator for PoolAllocator {
    fn alloc(&mut self, len: usize) -> Vec<f32> {
        match self.samples.get_mut(&len).and_then(Vec::pop) {
            Some(mut buf) => {
                self.reused += 1;
                buf.fill(0.0);
                buf
            }
            None => vec![0.0; len],
        }
    }

    fn alloc_bytes(&mut self, len: usize) -> Vec<u8> {
        match self.bytes.get_mut(&len).and_then(Vec::pop) {
            Some(mut buf) => {
                self.reused += 1;
                buf.fill(0);
                buf
            }
            None => vec![0; len],
        }
    }

    fn free(&mut self, buf: Vec<f32>) {
        self.samples.entry(buf.len()).or_default().push(buf);
    }

    fn free_bytes(&mut self, buf: Vec<u8>) {
        // Zero-sized payloads carry no memory worth keeping.
        if !buf.is_empty() {
            self.bytes.entry(buf.len()).or_default().push(buf);
        }
    }

    fn release(&mut self) {
        log::debug!("releasing {} pooled buffers", self.pooled());
        self.samples.clear();
        self.bytes.clear();
    }
}
