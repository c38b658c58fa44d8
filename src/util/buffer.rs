//! Aligned IO buffer
//!
//! O_DIRECT requires the buffer address to be aligned to the device transfer
//! alignment. The buffer is filled once with random bytes so compressing or
//! deduplicating storage cannot short-circuit the writes.

use crate::error::BenchError;
use crate::Result;
use rand::RngCore;
use std::alloc::{alloc, dealloc, Layout};

/// Memory-aligned buffer suitable for O_DIRECT operations
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    alignment: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate `size` bytes aligned to `alignment` (a power of two).
    ///
    /// Allocation failure is reported as an error rather than aborting, since
    /// the session skips the phase and carries on.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        let layout = Layout::from_size_align(size, alignment)
            .ok()
            .filter(|layout| layout.size() > 0)
            .ok_or(BenchError::BufferAllocation { size, alignment })?;

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc(layout) };
        if ptr.is_null() {
            return Err(BenchError::BufferAllocation { size, alignment }.into());
        }

        Ok(AlignedBuffer {
            ptr,
            size,
            alignment,
            layout,
        })
    }

    /// Allocate and fill with random bytes from the thread RNG
    pub fn new_random(size: usize, alignment: usize) -> Result<Self> {
        let mut buffer = Self::new(size, alignment)?;
        buffer.fill_random();
        Ok(buffer)
    }

    /// Get the buffer as a slice
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for size bytes for the life of self
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    /// Get the buffer as a mutable slice
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for size bytes and uniquely borrowed
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.alignment == 0
    }

    /// Overwrite the whole buffer with random bytes
    pub fn fill_random(&mut self) {
        rand::thread_rng().fill_bytes(self.as_mut_slice());
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with this exact layout
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}
