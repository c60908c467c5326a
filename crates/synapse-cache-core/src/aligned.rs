// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Aligned column storage
//!
//! Every numeric column of the cache lives in an [`AlignedColumn`]: a zeroed,
//! fixed-length flat array allocated on a wide boundary so vectorized consumers
//! can stream it. When the aligned request cannot be satisfied the allocator
//! falls back to the element type's natural alignment before giving up.

use crate::error::{CacheError, Result};
use bytemuck::Pod;
use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;
use tracing::warn;

/// Default column alignment in bytes (one AVX register)
pub const DEFAULT_COLUMN_ALIGNMENT: usize = 32;

/// Owning, zero-initialised, fixed-length array with a wide alignment
pub struct AlignedColumn<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    /// Layout used for the allocation (`None` when nothing was allocated)
    layout: Option<Layout>,
    _marker: PhantomData<T>,
}

impl<T: Pod> AlignedColumn<T> {
    /// Allocate `len` zeroed elements aligned to `alignment` bytes.
    ///
    /// Falls back to a plain zeroed allocation when the aligned path fails
    /// (including an alignment that is not a power of two).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::OutOfMemory` if the fallback allocation fails too.
    pub fn allocate(len: usize, alignment: usize) -> Result<Self> {
        let requested_bytes = len
            .checked_mul(size_of::<T>())
            .ok_or(CacheError::OutOfMemory {
                requested_bytes: usize::MAX,
            })?;

        if requested_bytes == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
                capacity: len,
                layout: None,
                _marker: PhantomData,
            });
        }

        let aligned = Layout::from_size_align(requested_bytes, alignment.max(align_of::<T>()))
            .ok()
            .and_then(|layout| {
                // SAFETY: layout has a non-zero size
                NonNull::new(unsafe { alloc::alloc_zeroed(layout) }).map(|ptr| (ptr, layout))
            });

        let (ptr, layout) = match aligned {
            Some(allocation) => allocation,
            None => {
                warn!(
                    "Memory alignment failed ({} bytes on {}-byte boundary). Trying normal allocation",
                    requested_bytes, alignment
                );
                let layout = Layout::array::<T>(len)
                    .map_err(|_| CacheError::OutOfMemory { requested_bytes })?;
                // SAFETY: layout has a non-zero size
                let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
                    .ok_or(CacheError::OutOfMemory { requested_bytes })?;
                (ptr, layout)
            }
        };

        Ok(Self {
            ptr: ptr.cast(),
            len,
            capacity: len,
            layout: Some(layout),
            _marker: PhantomData,
        })
    }

    /// Allocate into `slot` unless it already holds a column
    pub fn allocate_into(slot: &mut Option<Self>, len: usize, alignment: usize) -> Result<()> {
        if slot.is_none() {
            *slot = Some(Self::allocate(len, alignment)?);
        }
        Ok(())
    }

    /// Allocate a column holding a copy of `values`
    pub fn from_slice(values: &[T], alignment: usize) -> Result<Self> {
        let mut column = Self::allocate(values.len(), alignment)?;
        column.as_mut_slice().copy_from_slice(values);
        Ok(column)
    }

    /// Number of valid elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the column holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the allocation can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrink the logical length; the allocation is kept
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// Alignment the column was actually allocated with
    pub fn alignment(&self) -> usize {
        self.layout.map_or(align_of::<T>(), |layout| layout.align())
    }

    /// True if the first element sits on an `alignment`-byte boundary
    pub fn is_aligned_to(&self, alignment: usize) -> bool {
        alignment != 0 && (self.ptr.as_ptr() as usize) % alignment == 0
    }

    /// Read-only view of the valid elements
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for `capacity >= len` zero-initialised elements
        // (or dangling with no allocation when the byte size is zero)
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable view of the valid elements
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`; `&mut self` guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> Drop for AlignedColumn<T> {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: ptr was returned by `alloc_zeroed` with exactly this layout
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for AlignedColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedColumn")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .field("values", &self.as_slice())
            .finish()
    }
}

// SAFETY: the column uniquely owns its allocation; Pod values carry no thread affinity
unsafe impl<T: Pod + Send> Send for AlignedColumn<T> {}

// SAFETY: shared access only hands out `&[T]`; mutation requires `&mut self`
unsafe impl<T: Pod + Sync> Sync for AlignedColumn<T> {}
