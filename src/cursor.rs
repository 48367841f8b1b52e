//! Detached, re-validating positions over a [`DynArray`].
//!
//! A [`Cursor`] holds no borrow of its array, so the array can keep growing
//! while cursors exist. In exchange every cursor operation takes the array
//! and checks that the cursor still describes it:
//!
//! ```text
//!   Cursor { source, index, capacity, generation }
//!              │        │       │           │
//!              │        │       └─────┬─────┘
//!              │        │             └── snapshot at creation, compared
//!              │        │                 with the array on every use
//!              │        └── logical position, 0..=len
//!              └── which array issued it
//! ```
//!
//! Any mismatch is a contract violation and panics. [`Cursor::check`] and
//! [`Cursor::is_valid`] probe without panicking.

use std::{
  cmp::Ordering,
  num::NonZeroU64,
  sync::atomic::{self, AtomicU64},
};

use crate::{
  DynArray,
  alloc::RawAlloc,
  error::{self, ArrayError},
};

static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`DynArray`] instance.
///
/// Clones and [`take`](DynArray::take)n arrays get a fresh identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(NonZeroU64);

impl SourceId {
  pub(crate) fn next() -> Self {
    let raw = NEXT_SOURCE.fetch_add(1, atomic::Ordering::Relaxed);
    Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
  }
}

/// A copyable position in a [`DynArray`], invalidated by relocation.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct Cursor {
  source: SourceId,
  index: usize,
  capacity: usize,
  generation: u64,
}

impl Cursor {
  pub(crate) fn new<T, A: RawAlloc>(
    array: &DynArray<T, A>,
    index: usize,
  ) -> Self {
    Self {
      source: array.source_id(),
      index,
      capacity: array.capacity(),
      generation: array.generation(),
    }
  }

  /// Logical position: 0 is the first element, `len` is the end.
  pub fn index(&self) -> usize {
    self.index
  }

  /// The array this cursor was taken from.
  pub fn source(&self) -> SourceId {
    self.source
  }

  /// Reports why this cursor can no longer be used with `array`, if it can't.
  pub fn check<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) -> Result<(), ArrayError> {
    if self.source != array.source_id() {
      return Err(ArrayError::ForeignCursor);
    }
    if self.capacity != array.capacity() || self.generation != array.generation() {
      return Err(ArrayError::StaleCursor);
    }
    if self.index > array.len() {
      return Err(ArrayError::CursorPastEnd {
        index: self.index,
        len: array.len(),
      });
    }
    Ok(())
  }

  /// Whether this cursor may still be used with `array`.
  pub fn is_valid<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) -> bool {
    self.check(array).is_ok()
  }

  /// Whether this cursor sits one past the last element.
  pub fn is_end<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) -> bool {
    self.validate(array);
    self.index == array.len()
  }

  /// Dereferences the cursor.
  ///
  /// # Panics
  ///
  /// When the cursor is invalid for `array` or sits at the end.
  #[track_caller]
  pub fn get<'a, T, A: RawAlloc>(
    &self,
    array: &'a DynArray<T, A>,
  ) -> &'a T {
    self.validate(array);
    match array.as_slice().get(self.index) {
      Some(element) => element,
      None => error::cursor_out_of_range("dereference", self.index, array.len()),
    }
  }

  /// Mutable dereference. Same contract as [`get`](Self::get).
  #[track_caller]
  pub fn get_mut<'a, T, A: RawAlloc>(
    &self,
    array: &'a mut DynArray<T, A>,
  ) -> &'a mut T {
    self.validate(array);
    let len = array.len();
    match array.as_mut_slice().get_mut(self.index) {
      Some(element) => element,
      None => error::cursor_out_of_range("dereference", self.index, len),
    }
  }

  /// The element `offset` positions away from this cursor.
  #[track_caller]
  pub fn at<'a, T, A: RawAlloc>(
    &self,
    array: &'a DynArray<T, A>,
    offset: isize,
  ) -> &'a T {
    self.offset(array, offset).get(array)
  }

  /// Moves one position forward in place.
  ///
  /// # Panics
  ///
  /// When already at the end, or when the cursor is invalid.
  #[track_caller]
  pub fn step_forward<T, A: RawAlloc>(
    &mut self,
    array: &DynArray<T, A>,
  ) {
    self.validate(array);
    if self.index >= array.len() {
      error::cursor_out_of_range("increment", self.index, array.len());
    }
    self.index += 1;
  }

  /// Moves one position back in place.
  ///
  /// # Panics
  ///
  /// When already at the first position, or when the cursor is invalid.
  #[track_caller]
  pub fn step_back<T, A: RawAlloc>(
    &mut self,
    array: &DynArray<T, A>,
  ) {
    self.validate(array);
    if self.index == 0 {
      error::cursor_out_of_range("decrement", self.index, array.len());
    }
    self.index -= 1;
  }

  /// The following position, leaving `self` where it is.
  #[track_caller]
  pub fn next<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) -> Cursor {
    let mut next = *self;
    next.step_forward(array);
    next
  }

  /// The preceding position, leaving `self` where it is.
  #[track_caller]
  pub fn previous<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) -> Cursor {
    let mut previous = *self;
    previous.step_back(array);
    previous
  }

  /// The position `delta` steps away. The result may be the end position.
  ///
  /// # Panics
  ///
  /// When the result would fall outside `0..=len`, or when the cursor is
  /// invalid.
  #[track_caller]
  pub fn offset<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
    delta: isize,
  ) -> Cursor {
    self.validate(array);
    match self.index.checked_add_signed(delta) {
      Some(index) if index <= array.len() => Cursor { index, ..*self },
      _ => error::cursor_out_of_range("offset", self.index, array.len()),
    }
  }

  /// Moves `delta` steps in place. Same contract as [`offset`](Self::offset).
  #[track_caller]
  pub fn advance<T, A: RawAlloc>(
    &mut self,
    array: &DynArray<T, A>,
    delta: isize,
  ) {
    *self = self.offset(array, delta);
  }

  /// Number of steps from `self` to `other`.
  ///
  /// # Panics
  ///
  /// When the cursors come from different arrays.
  #[track_caller]
  pub fn distance_to(
    &self,
    other: &Cursor,
  ) -> isize {
    if self.source != other.source {
      error::invalid_cursor(ArrayError::ForeignCursor);
    }
    other.index as isize - self.index as isize
  }

  #[track_caller]
  fn validate<T, A: RawAlloc>(
    &self,
    array: &DynArray<T, A>,
  ) {
    if let Err(err) = self.check(array) {
      error::invalid_cursor(err);
    }
  }
}

impl PartialEq for Cursor {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.source == other.source && self.index == other.index
  }
}

impl Eq for Cursor {}

impl PartialOrd for Cursor {
  fn partial_cmp(
    &self,
    other: &Self,
  ) -> Option<Ordering> {
    if self.source != other.source {
      return None;
    }
    Some(self.index.cmp(&other.index))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dyn_array;

  #[test]
  fn test_begin_equals_end_on_empty() {
    let array = DynArray::<i32>::new();

    assert_eq!(array.begin(), array.end());
    assert!(array.begin().is_end(&array));
  }

  #[test]
  fn test_begin_differs_from_end_when_populated() {
    let mut array = DynArray::new();
    array.push_back(500);

    assert_ne!(array.begin(), array.end());
    assert_eq!(*array.begin().get(&array), 500);
  }

  #[test]
  fn test_walk_forward() {
    let array: DynArray<i32> = (0..100).collect();
    let mut cursor = array.begin();

    for expected in 0..100 {
      assert_eq!(*cursor.get(&array), expected);
      cursor.step_forward(&array);
    }
    assert_eq!(cursor, array.end());
  }

  #[test]
  fn test_walk_backward() {
    let array: DynArray<i32> = (0..100).collect();
    let mut cursor = array.end();

    for expected in (0..100).rev() {
      cursor.step_back(&array);
      assert_eq!(*cursor.get(&array), expected);
    }
    assert_eq!(cursor, array.begin());
  }

  #[test]
  fn test_next_and_previous_leave_cursor_in_place() {
    let array = dyn_array![1, 2, 3];
    let cursor = array.begin();

    let next = cursor.next(&array);

    assert_eq!(cursor.index(), 0);
    assert_eq!(*next.get(&array), 2);
    assert_eq!(next.previous(&array), cursor);
  }

  #[test]
  fn test_random_access() {
    let array = dyn_array![10, 20, 30, 40];
    let mut cursor = array.begin().offset(&array, 2);

    assert_eq!(*cursor.get(&array), 30);
    assert_eq!(*cursor.at(&array, -2), 10);
    assert_eq!(*cursor.at(&array, 1), 40);

    cursor.advance(&array, -1);
    assert_eq!(*cursor.get(&array), 20);

    assert_eq!(array.begin().offset(&array, 4), array.end());
  }

  #[test]
  fn test_distance_and_ordering() {
    let array = dyn_array![1, 2, 3, 4, 5];
    let begin = array.begin();
    let end = array.end();

    assert_eq!(begin.distance_to(&end), 5);
    assert_eq!(end.distance_to(&begin), -5);
    assert!(begin < end);
    assert!(end >= begin);
    assert!(begin <= begin.offset(&array, 0));
  }

  #[test]
  fn test_cursors_of_different_arrays_are_unordered() {
    let left = dyn_array![1];
    let right = dyn_array![1];

    assert_ne!(left.begin(), right.begin());
    assert_eq!(left.begin().partial_cmp(&right.begin()), None);
  }

  #[test]
  fn test_get_mut_writes_through() {
    let mut array = dyn_array![1, 2, 3];
    let cursor = array.cursor_at(1);

    *cursor.get_mut(&mut array) = 20;

    assert_eq!(array, [1, 20, 3]);
  }

  #[test]
  fn test_relocation_invalidates() {
    let mut array = DynArray::new();
    array.push_back(500);
    let cursor = array.begin();
    assert!(cursor.is_valid(&array));

    let capacity = array.capacity();
    while array.capacity() == capacity {
      array.push_back(1000);
    }

    assert_eq!(cursor.check(&array), Err(ArrayError::StaleCursor));
  }

  #[test]
  fn test_release_and_regrow_to_same_capacity_invalidates() {
    let mut array = DynArray::with_capacity(4);
    array.push_back(1u8);
    let cursor = array.begin();

    array.resize(0, 0);
    array.resize(4, 9);

    assert_eq!(array.capacity(), 4);
    assert_eq!(cursor.check(&array), Err(ArrayError::StaleCursor));
  }

  #[test]
  fn test_push_within_capacity_keeps_cursor_valid() {
    let mut array = DynArray::with_capacity(8);
    array.push_back(1);
    let cursor = array.begin();

    array.push_back(2);
    array.push_back(3);

    assert!(cursor.is_valid(&array));
    assert_eq!(*cursor.get(&array), 1);
  }

  #[test]
  fn test_truncation_past_cursor_is_reported() {
    let mut array = dyn_array![1, 2, 3, 4];
    array.reserve(8);
    let cursor = array.cursor_at(3);

    array.truncate(1);

    assert_eq!(cursor.check(&array), Err(ArrayError::CursorPastEnd { index: 3, len: 1 }));
  }

  #[test]
  fn test_foreign_cursor_is_reported() {
    let left = dyn_array![1, 2];
    let right = left.clone();

    assert_eq!(left.begin().check(&right), Err(ArrayError::ForeignCursor));
  }

  #[test]
  #[should_panic(expected = "invalid cursor: stale cursor")]
  fn test_stale_dereference_panics() {
    let mut array = DynArray::new();
    array.push_back(500);
    let cursor = array.begin();
    for value in 0..16 {
      array.push_back(value);
    }

    let _ = cursor.get(&array);
  }

  #[test]
  #[should_panic(expected = "cursor dereference out of range")]
  fn test_end_dereference_panics() {
    let array = dyn_array![1, 2];
    let _ = array.end().get(&array);
  }

  #[test]
  #[should_panic(expected = "cursor increment out of range")]
  fn test_increment_on_empty_panics() {
    let array = DynArray::<i32>::new();
    let mut cursor = array.begin();
    cursor.step_forward(&array);
  }

  #[test]
  #[should_panic(expected = "cursor decrement out of range")]
  fn test_decrement_on_empty_panics() {
    let array = DynArray::<i32>::new();
    let mut cursor = array.begin();
    cursor.step_back(&array);
  }

  #[test]
  #[should_panic(expected = "cursor offset out of range")]
  fn test_offset_past_end_panics() {
    let array = dyn_array![1, 2];
    let _ = array.begin().offset(&array, 3);
  }

  #[test]
  #[should_panic(expected = "cursor belongs to a different array")]
  fn test_distance_across_arrays_panics() {
    let left = dyn_array![1];
    let right = dyn_array![1];
    let _ = left.begin().distance_to(&right.end());
  }
}
