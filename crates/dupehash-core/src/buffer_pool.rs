//! A small pool of reusable I/O buffers (spec §4.4: "Buffer management").
//!
//! Every worker's file reads go through fixed-size blocks pulled from this pool
//! instead of allocating a fresh `Vec` per read. Buffers are returned on every
//! exit path — including early return on cancellation or I/O error — via the
//! `PooledBuffer` guard's `Drop` impl, so a panic-free caller can never leak one.

use parking_lot::Mutex;
use std::sync::Arc;

/// Default block size for pooled I/O buffers (4 KiB, per spec §4.2).
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

#[derive(Debug)]
struct Inner {
    block_size: usize,
    free: Mutex<Vec<Box<[u8]>>>,
}

/// Shared pool of reusable byte buffers, safe to rent from and return to
/// concurrently (spec §5: "the byte-buffer pool must be safe for concurrent
/// rent/return").
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    /// Create a pool handing out buffers of `block_size` bytes.
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                block_size,
                free: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Rent a buffer, reusing a returned one if available or allocating fresh.
    #[must_use]
    pub fn rent(&self) -> PooledBuffer {
        let buf = self
            .inner
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.inner.block_size].into_boxed_slice());
        PooledBuffer {
            buf: Some(buf),
            pool: self.inner.clone(),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

/// A rented buffer. Returned to the pool automatically when dropped.
pub struct PooledBuffer {
    buf: Option<Box<[u8]>>,
    pool: Arc<Inner>,
}

impl PooledBuffer {
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buf.as_mut().expect("buffer taken before drop")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.as_ref().map_or(0, |b| b.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.free.lock().push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_returns_requested_size() {
        let pool = BufferPool::new(128);
        let buf = pool.rent();
        assert_eq!(buf.len(), 128);
    }

    #[test]
    fn returned_buffer_is_reused() {
        let pool = BufferPool::new(64);
        {
            let _buf = pool.rent();
        }
        assert_eq!(pool.inner.free.lock().len(), 1);
        let _buf2 = pool.rent();
        assert_eq!(pool.inner.free.lock().len(), 0);
    }

    #[test]
    fn concurrent_rent_and_return_is_safe() {
        let pool = BufferPool::new(32);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.rent();
                        buf.as_mut_slice()[0] = 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
