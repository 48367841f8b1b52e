//! Recoverable error types.
//!
//! Contract violations (bad indices, stale cursors on dereference, popping an
//! empty array) are not represented here: they panic at the point of
//! detection. These types cover the probes and optional paths that report
//! instead of failing fast.

use thiserror::Error;

/// Errors reported by the non-fatal entry points of [`DynArray`](crate::DynArray)
/// and [`Cursor`](crate::Cursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
  /// The requested slot count does not fit in `isize::MAX` bytes.
  #[error("capacity overflow: {requested} slots do not fit in the address space")]
  CapacityOverflow {
    /// Number of slots requested.
    requested: usize,
  },

  /// The allocator could not provide a block, either in place or fresh.
  #[error("allocation of {bytes} bytes failed")]
  AllocFailed {
    /// Size of the block that was requested.
    bytes: usize,
  },

  /// The cursor was taken before its array last relocated its buffer.
  #[error("stale cursor: array relocated since the cursor was taken")]
  StaleCursor,

  /// The cursor belongs to a different array.
  #[error("cursor belongs to a different array")]
  ForeignCursor,

  /// The cursor's position is past the end after the array was truncated.
  #[error("cursor position {index} is past the end (len {len})")]
  CursorPastEnd {
    /// Position recorded by the cursor.
    index: usize,
    /// Current length of the array.
    len: usize,
  },

  /// The array configuration was rejected.
  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Rejections from [`ArrayConfig::validate`](crate::ArrayConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// Growth must strictly enlarge the buffer to keep appends amortized O(1).
  #[error("growth factor {num}/{den} must be greater than 1")]
  GrowthFactorTooSmall {
    /// Numerator of the rejected factor.
    num: usize,
    /// Denominator of the rejected factor.
    den: usize,
  },

  /// A growth factor with a zero denominator.
  #[error("growth factor denominator must not be zero")]
  ZeroDenominator,
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn index_out_of_bounds(
  index: usize,
  len: usize,
) -> ! {
  panic!("index out of bounds: the len is {len} but the index is {index}");
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn empty_array(operation: &str) -> ! {
  panic!("{operation} called on an empty array");
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn capacity_overflow(requested: usize) -> ! {
  panic!("capacity overflow: {requested} slots requested");
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn invalid_cursor(err: ArrayError) -> ! {
  panic!("invalid cursor: {err}");
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn cursor_out_of_range(
  operation: &str,
  index: usize,
  len: usize,
) -> ! {
  panic!("cursor {operation} out of range: position {index}, len {len}");
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_errors_convert_into_array_errors() {
    let err: ArrayError = ConfigError::ZeroDenominator.into();

    assert_eq!(err, ArrayError::Config(ConfigError::ZeroDenominator));
    assert_eq!(err.to_string(), "growth factor denominator must not be zero");
  }

  #[test]
  fn messages_name_the_numbers() {
    let err = ArrayError::AllocFailed { bytes: 4096 };
    assert_eq!(err.to_string(), "allocation of 4096 bytes failed");

    let err = ConfigError::GrowthFactorTooSmall { num: 1, den: 1 };
    assert_eq!(err.to_string(), "growth factor 1/1 must be greater than 1");
  }
}
