use std::ptr;

use libc::{c_void, free, malloc, realloc};

/// Source of untyped memory blocks for a [`DynArray`](crate::DynArray).
///
/// The contract mirrors the C allocation functions: a failed call returns
/// null and leaves any existing block untouched.
///
/// # Safety
///
/// Implementors must return blocks aligned to at least
/// [`MALLOC_ALIGN`](crate::layout::MALLOC_ALIGN) and valid for reads and
/// writes of the requested size until they are reallocated or deallocated.
pub unsafe trait RawAlloc {
  /// Returns a block of `bytes` bytes, or null. `bytes` is never zero.
  fn allocate(
    &self,
    bytes: usize,
  ) -> *mut u8;

  /// Resizes `block` to `bytes` bytes, possibly moving it, preserving the
  /// common prefix. Returns null on failure, in which case `block` is still
  /// owned by the caller and unchanged.
  ///
  /// # Safety
  ///
  /// `block` must have been returned by this allocator and not yet freed.
  unsafe fn reallocate(
    &self,
    block: *mut u8,
    bytes: usize,
  ) -> *mut u8;

  /// Frees `block`.
  ///
  /// # Safety
  ///
  /// `block` must have been returned by this allocator and not yet freed.
  unsafe fn deallocate(
    &self,
    block: *mut u8,
  );
}

/// The C heap: `malloc`, `realloc` and `free`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Libc;

unsafe impl RawAlloc for Libc {
  fn allocate(
    &self,
    bytes: usize,
  ) -> *mut u8 {
    unsafe { malloc(bytes) as *mut u8 }
  }

  unsafe fn reallocate(
    &self,
    block: *mut u8,
    bytes: usize,
  ) -> *mut u8 {
    unsafe { realloc(block as *mut c_void, bytes) as *mut u8 }
  }

  unsafe fn deallocate(
    &self,
    block: *mut u8,
  ) {
    if block.is_null() {
      return;
    }
    unsafe { free(block as *mut c_void) }
  }
}

/// Allocators with injectable failures, for exercising the fallback paths.
#[cfg(test)]
pub(crate) mod testing {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  /// Shared counters and switches. Clones of a [`Flaky`] share one `Stats`.
  #[derive(Debug, Default)]
  pub(crate) struct Stats {
    pub fail_realloc: Cell<bool>,
    pub fail_alloc: Cell<bool>,
    pub allocs: Cell<usize>,
    pub reallocs: Cell<usize>,
    pub frees: Cell<usize>,
  }

  impl Stats {
    /// Blocks handed out and not yet returned.
    pub fn live(&self) -> usize {
      self.allocs.get() - self.frees.get()
    }
  }

  /// Wraps [`Libc`] and fails on demand.
  #[derive(Clone, Debug, Default)]
  pub(crate) struct Flaky {
    pub stats: Rc<Stats>,
  }

  impl Flaky {
    pub fn new() -> Self {
      Self::default()
    }

    /// An allocator whose `reallocate` always fails.
    pub fn failing_realloc() -> Self {
      let flaky = Self::new();
      flaky.stats.fail_realloc.set(true);
      flaky
    }
  }

  unsafe impl RawAlloc for Flaky {
    fn allocate(
      &self,
      bytes: usize,
    ) -> *mut u8 {
      if self.stats.fail_alloc.get() {
        return ptr::null_mut();
      }
      self.stats.allocs.set(self.stats.allocs.get() + 1);
      Libc.allocate(bytes)
    }

    unsafe fn reallocate(
      &self,
      block: *mut u8,
      bytes: usize,
    ) -> *mut u8 {
      if self.stats.fail_realloc.get() {
        return ptr::null_mut();
      }
      self.stats.reallocs.set(self.stats.reallocs.get() + 1);
      unsafe { Libc.reallocate(block, bytes) }
    }

    unsafe fn deallocate(
      &self,
      block: *mut u8,
    ) {
      self.stats.frees.set(self.stats.frees.get() + 1);
      unsafe { Libc.deallocate(block) }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::MALLOC_ALIGN;

  #[test]
  fn test_libc_round_trip() {
    unsafe {
      let first = Libc.allocate(8) as *mut u64;
      assert!(!first.is_null());
      assert_eq!(first as usize % MALLOC_ALIGN, 0);

      *first = 3u64;
      assert_eq!(*first, 3);

      let grown = Libc.reallocate(first as *mut u8, 6 * 8) as *mut u64;
      assert!(!grown.is_null());
      assert_eq!(*grown, 3);

      for i in 1..6 {
        *grown.add(i) = (i + 1) as u64;
      }
      for i in 1..6 {
        assert_eq!((i + 1) as u64, *grown.add(i));
      }

      Libc.deallocate(grown as *mut u8);
    }
  }

  #[test]
  fn test_free_null_is_ignored() {
    unsafe { Libc.deallocate(ptr::null_mut()) };
  }

  #[test]
  fn test_flaky_counts_and_fails() {
    let flaky = testing::Flaky::failing_realloc();

    unsafe {
      let block = flaky.allocate(16);
      assert!(!block.is_null());
      assert!(flaky.reallocate(block, 32).is_null());

      flaky.stats.fail_alloc.set(true);
      assert!(flaky.allocate(16).is_null());

      flaky.deallocate(block);
    }

    assert_eq!(flaky.stats.allocs.get(), 1);
    assert_eq!(flaky.stats.reallocs.get(), 0);
    assert_eq!(flaky.stats.live(), 0);
  }
}
