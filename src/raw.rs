use std::{marker::PhantomData, mem, ptr};

use crate::{alloc::RawAlloc, error::ArrayError, layout};

/// How a block reached its new capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relocation {
  /// There was no block; a fresh one was allocated.
  Allocated,
  /// The allocator resized the block, in place or by moving it itself.
  Reallocated,
  /// Resizing failed; a fresh block was allocated, the live prefix copied
  /// and the old block freed.
  Copied,
}

/// An exclusively owned block of `capacity` uninitialized slots of `T`.
///
/// The buffer never reads, writes or drops elements. Callers track which
/// prefix is initialized and pass it to [`relocate`](Self::relocate).
pub(crate) struct RawBuffer<T, A: RawAlloc> {
  ptr: *mut T,
  capacity: usize,
  alloc: A,
  _marker: PhantomData<T>,
}

// Ownership is exclusive, like `Box<[T]>`.
unsafe impl<T: Send, A: RawAlloc + Send> Send for RawBuffer<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for RawBuffer<T, A> {}

impl<T, A: RawAlloc> RawBuffer<T, A> {
  pub const fn new_in(alloc: A) -> Self {
    Self {
      ptr: ptr::null_mut(),
      capacity: 0,
      alloc,
      _marker: PhantomData,
    }
  }

  /// Start of the block; null while nothing is allocated.
  #[inline]
  pub fn ptr(&self) -> *mut T {
    self.ptr
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  /// Slot index of `target` when it points into this block.
  pub fn slot_of(
    &self,
    target: *const T,
  ) -> Option<usize> {
    if self.ptr.is_null() {
      return None;
    }
    let start = self.ptr as usize;
    let end = start + self.capacity * mem::size_of::<T>();
    let addr = target as usize;
    if addr < start || addr >= end {
      return None;
    }
    debug_assert_eq!((addr - start) % mem::size_of::<T>(), 0);
    Some((addr - start) / mem::size_of::<T>())
  }

  /// Moves the block to exactly `new_capacity` slots, keeping the first
  /// `live` slots.
  ///
  /// Tries the allocator's resize first. If that fails, allocates a fresh
  /// block, copies the live slots and frees the old block. If both fail the
  /// buffer is untouched and the error is returned.
  ///
  /// # Safety
  ///
  /// `live` must not exceed the current capacity or `new_capacity`, and
  /// `new_capacity` must be non-zero.
  pub unsafe fn relocate(
    &mut self,
    new_capacity: usize,
    live: usize,
  ) -> Result<Relocation, ArrayError> {
    debug_assert!(new_capacity > 0);
    debug_assert!(live <= self.capacity && live <= new_capacity);

    let bytes = layout::array_bytes::<T>(new_capacity)?;

    if self.ptr.is_null() {
      let block = self.alloc.allocate(bytes);
      if block.is_null() {
        return Err(ArrayError::AllocFailed { bytes });
      }
      tracing::trace!(bytes, address = ?block, "allocated element block");
      self.install(block, new_capacity);
      return Ok(Relocation::Allocated);
    }

    let old = self.ptr as *mut u8;

    let resized = unsafe { self.alloc.reallocate(old, bytes) };
    if !resized.is_null() {
      tracing::trace!(
        bytes,
        from = ?old,
        to = ?resized,
        "reallocated element block"
      );
      self.install(resized, new_capacity);
      return Ok(Relocation::Reallocated);
    }

    let fresh = self.alloc.allocate(bytes);
    if fresh.is_null() {
      return Err(ArrayError::AllocFailed { bytes });
    }

    unsafe {
      ptr::copy_nonoverlapping(self.ptr, fresh as *mut T, live);
      self.alloc.deallocate(old);
    }
    tracing::debug!(
      bytes,
      live,
      from = ?old,
      to = ?fresh,
      "resize failed, copied element block"
    );
    self.install(fresh, new_capacity);
    Ok(Relocation::Copied)
  }

  /// Frees the block. Elements still in it are not dropped.
  pub fn release(&mut self) {
    if self.ptr.is_null() {
      return;
    }
    tracing::trace!(address = ?self.ptr, capacity = self.capacity, "released element block");
    unsafe { self.alloc.deallocate(self.ptr as *mut u8) };
    self.ptr = ptr::null_mut();
    self.capacity = 0;
  }

  fn install(
    &mut self,
    block: *mut u8,
    capacity: usize,
  ) {
    self.ptr = block as *mut T;
    self.capacity = capacity;
  }
}

impl<T, A: RawAlloc> Drop for RawBuffer<T, A> {
  fn drop(&mut self) {
    self.release();
  }
}
