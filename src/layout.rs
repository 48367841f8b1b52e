//! Byte-size and alignment rules for element blocks.
//!
//! Blocks come from `malloc`, so they are only aligned to the platform's
//! fundamental alignment. Element types with a stricter alignment are
//! rejected at compile time by [`assert_storable`].

use std::{alloc::Layout, mem};

use crate::error::ArrayError;

/// Alignment every `malloc` block is guaranteed to have.
///
/// C guarantees `alignof(max_align_t)`, which is two machine words on the
/// platforms `libc` targets.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use rvector::layout::MALLOC_ALIGN;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(MALLOC_ALIGN, 16), // 64 bit machine.
///     4 => assert_eq!(MALLOC_ALIGN, 8),  // 32 bit machine.
///     _ => {},
/// };
/// ```
pub const MALLOC_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Whether `T` can live in a block returned by the allocator.
pub const fn is_storable<T>() -> bool {
  mem::size_of::<T>() != 0 && mem::align_of::<T>() <= MALLOC_ALIGN
}

/// Compile-time check that `T` is a sized, non-zero-sized, `malloc`-aligned
/// element type. Evaluated once per monomorphization.
pub(crate) const fn assert_storable<T>() {
  assert!(mem::size_of::<T>() != 0, "zero-sized element types are not supported");
  assert!(
    mem::align_of::<T>() <= MALLOC_ALIGN,
    "element alignment exceeds the allocator guarantee"
  );
}

/// Size in bytes of a block holding `slots` elements of `T`.
///
/// Fails when the block would exceed `isize::MAX` bytes.
pub fn array_bytes<T>(slots: usize) -> Result<usize, ArrayError> {
  Layout::array::<T>(slots)
    .map(|layout| layout.size())
    .map_err(|_| ArrayError::CapacityOverflow { requested: slots })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_array_bytes() {
    let word = mem::size_of::<usize>();

    for slots in 0..64 {
      assert_eq!(array_bytes::<usize>(slots), Ok(slots * word));
      assert_eq!(array_bytes::<u8>(slots), Ok(slots));
      assert_eq!(array_bytes::<(u8, u32)>(slots), Ok(slots * 8));
    }
  }

  #[test]
  fn test_array_bytes_overflow() {
    assert_eq!(
      array_bytes::<u64>(usize::MAX),
      Err(ArrayError::CapacityOverflow {
        requested: usize::MAX
      })
    );
    assert!(array_bytes::<u8>(isize::MAX as usize).is_ok());
    assert!(array_bytes::<u16>(isize::MAX as usize).is_err());
  }

  #[test]
  fn test_storable() {
    #[repr(align(64))]
    struct CacheLine(#[allow(dead_code)] u8);

    assert!(is_storable::<u64>());
    assert!(is_storable::<String>());
    assert!(!is_storable::<()>());
    assert!(!is_storable::<CacheLine>());
  }
}
