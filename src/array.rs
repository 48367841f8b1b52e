use std::{
  alloc::{Layout, handle_alloc_error},
  fmt,
  mem::{self, ManuallyDrop},
  ops::{Deref, DerefMut, Index, IndexMut},
  ptr, slice,
};

use crate::{
  alloc::{Libc, RawAlloc},
  config::{ArrayConfig, ReservePolicy, ZeroResize},
  cursor::{Cursor, SourceId},
  error::{self, ArrayError},
  into_iter::IntoIter,
  layout,
  raw::{RawBuffer, Relocation},
};

/// A contiguous growable array over a raw `malloc` block.
///
/// Indexing is always bounds-checked and panics on a bad index. Growth
/// multiplies the capacity by the configured [`GrowthFactor`], so appends
/// are amortized O(1).
///
/// Every change of the underlying block (growth, shrink, release, hand-off)
/// bumps the array's generation, which invalidates outstanding [`Cursor`]s.
///
/// [`GrowthFactor`]: crate::GrowthFactor
pub struct DynArray<T, A: RawAlloc = Libc> {
  buf: RawBuffer<T, A>,
  len: usize,
  reserved_hint: usize,
  config: ArrayConfig,
  id: SourceId,
  generation: u64,
}

impl<T> DynArray<T> {
  /// An empty array. Nothing is allocated until the first insertion.
  pub fn new() -> Self {
    Self::new_in(Libc)
  }

  /// An empty array with exactly `capacity` slots allocated.
  pub fn with_capacity(capacity: usize) -> Self {
    Self::with_capacity_in(capacity, Libc)
  }

  /// An array built from `config`.
  ///
  /// # Panics
  ///
  /// When `config` does not [validate](ArrayConfig::validate).
  pub fn with_config(config: ArrayConfig) -> Self {
    Self::with_config_in(config, Libc)
  }

  /// Like [`with_config`](Self::with_config), reporting a bad config.
  pub fn try_with_config(config: ArrayConfig) -> Result<Self, ArrayError> {
    Self::try_with_config_in(config, Libc)
  }

  /// `count` clones of `value`, with `capacity == count`.
  pub fn from_elem(
    value: T,
    count: usize,
  ) -> Self
  where
    T: Clone,
  {
    let mut array = Self::new();
    array.resize(count, value);
    array
  }
}

impl<T, A: RawAlloc> DynArray<T, A> {
  /// An empty array drawing memory from `alloc`.
  pub fn new_in(alloc: A) -> Self {
    const { layout::assert_storable::<T>() };
    Self {
      buf: RawBuffer::new_in(alloc),
      len: 0,
      reserved_hint: 0,
      config: ArrayConfig::new(),
      id: SourceId::next(),
      generation: 0,
    }
  }

  pub fn with_capacity_in(
    capacity: usize,
    alloc: A,
  ) -> Self {
    let mut array = Self::new_in(alloc);
    if capacity > 0 {
      array.relocate_required(capacity);
    }
    array
  }

  pub fn with_config_in(
    config: ArrayConfig,
    alloc: A,
  ) -> Self {
    match Self::try_with_config_in(config, alloc) {
      Ok(array) => array,
      Err(err) => panic!("invalid array configuration: {err}"),
    }
  }

  /// Validates `config`, then allocates `config.initial_capacity` slots.
  pub fn try_with_config_in(
    config: ArrayConfig,
    alloc: A,
  ) -> Result<Self, ArrayError> {
    config.validate()?;
    let mut array = Self::new_in(alloc);
    array.config = config;
    if config.initial_capacity > 0 {
      array.relocate_required(config.initial_capacity);
    }
    Ok(array)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.buf.capacity()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn config(&self) -> &ArrayConfig {
    &self.config
  }

  pub fn allocator(&self) -> &A {
    self.buf.allocator()
  }

  /// A reservation recorded under [`ReservePolicy::Deferred`] and not yet
  /// applied.
  pub fn pending_reserve(&self) -> Option<usize> {
    (self.reserved_hint > 0).then_some(self.reserved_hint)
  }

  /// Identity checked by cursors.
  pub fn source_id(&self) -> SourceId {
    self.id
  }

  /// Counter bumped every time the block is relocated or released.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Start of the block, or null when nothing is allocated.
  pub fn as_ptr(&self) -> *const T {
    self.buf.ptr()
  }

  pub fn as_mut_ptr(&mut self) -> *mut T {
    self.buf.ptr()
  }

  pub fn as_slice(&self) -> &[T] {
    if self.buf.ptr().is_null() {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.buf.ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    if self.buf.ptr().is_null() {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.buf.ptr(), self.len) }
  }

  /// The element at `index`.
  ///
  /// # Panics
  ///
  /// When `index >= len`.
  #[track_caller]
  pub fn at(
    &self,
    index: usize,
  ) -> &T {
    match self.as_slice().get(index) {
      Some(element) => element,
      None => error::index_out_of_bounds(index, self.len),
    }
  }

  #[track_caller]
  pub fn at_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    let len = self.len;
    match self.as_mut_slice().get_mut(index) {
      Some(element) => element,
      None => error::index_out_of_bounds(index, len),
    }
  }

  /// # Panics
  ///
  /// When the array is empty.
  #[track_caller]
  pub fn front(&self) -> &T {
    match self.as_slice().first() {
      Some(element) => element,
      None => error::empty_array("front"),
    }
  }

  /// # Panics
  ///
  /// When the array is empty.
  #[track_caller]
  pub fn back(&self) -> &T {
    match self.as_slice().last() {
      Some(element) => element,
      None => error::empty_array("back"),
    }
  }

  /// Cursor at the first element, equal to [`end`](Self::end) when empty.
  pub fn begin(&self) -> Cursor {
    Cursor::new(self, 0)
  }

  /// Cursor one past the last element.
  pub fn end(&self) -> Cursor {
    Cursor::new(self, self.len)
  }

  /// Cursor at `index`, which may be `len`.
  #[track_caller]
  pub fn cursor_at(
    &self,
    index: usize,
  ) -> Cursor {
    if index > self.len {
      error::index_out_of_bounds(index, self.len);
    }
    Cursor::new(self, index)
  }

  /// Ensures room for `capacity` elements in total.
  ///
  /// Under [`ReservePolicy::Immediate`] the block is resized to exactly
  /// `capacity` slots now; under [`ReservePolicy::Deferred`] the request is
  /// kept and applied by the next growth. If the allocator cannot satisfy
  /// the request the array is left unchanged.
  pub fn reserve(
    &mut self,
    capacity: usize,
  ) {
    if capacity <= self.capacity() {
      return;
    }
    match self.config.reserve {
      ReservePolicy::Deferred => {
        self.reserved_hint = self.reserved_hint.max(capacity);
        tracing::trace!(capacity, "deferred reservation");
      }
      ReservePolicy::Immediate => {
        if let Err(err) = self.try_reserve(capacity) {
          tracing::warn!(%err, capacity, "reservation not satisfied, capacity unchanged");
        }
      }
    }
  }

  /// Resizes the block to `capacity` slots now if it is smaller, regardless
  /// of the reserve policy.
  pub fn try_reserve(
    &mut self,
    capacity: usize,
  ) -> Result<(), ArrayError> {
    if capacity <= self.capacity() {
      return Ok(());
    }
    self.relocate_optional(capacity)?;
    if self.reserved_hint <= capacity {
      self.reserved_hint = 0;
    }
    Ok(())
  }

  /// Resizes to `new_len` elements and exactly `new_len` slots, filling new
  /// slots with clones of `value`.
  ///
  /// `resize(0, _)` frees the block under [`ZeroResize::Release`] (the
  /// default) and acts like [`clear`](Self::clear) under
  /// [`ZeroResize::Retain`].
  pub fn resize(
    &mut self,
    new_len: usize,
    value: T,
  ) where
    T: Clone,
  {
    self.resize_with(new_len, || value.clone());
  }

  /// [`resize`](Self::resize) filling with `T::default()`.
  pub fn resize_default(
    &mut self,
    new_len: usize,
  ) where
    T: Default,
  {
    self.resize_with(new_len, T::default);
  }

  /// [`resize`](Self::resize) filling with the results of `fill`.
  pub fn resize_with<F>(
    &mut self,
    new_len: usize,
    mut fill: F,
  ) where
    F: FnMut() -> T,
  {
    if new_len == 0 && self.config.zero_resize == ZeroResize::Retain {
      self.clear();
      return;
    }

    self.truncate(new_len);

    if new_len == 0 {
      self.release_block();
      return;
    }

    if new_len > self.capacity() {
      self.relocate_required(new_len);
    } else if new_len < self.capacity() {
      if let Err(err) = self.relocate_optional(new_len) {
        tracing::warn!(%err, new_len, "shrinking resize kept the larger block");
      }
    }

    while self.len < new_len {
      unsafe { self.buf.ptr().add(self.len).write(fill()) };
      self.len += 1;
    }
  }

  /// Drops the elements from `len` onwards. Capacity is unchanged.
  pub fn truncate(
    &mut self,
    len: usize,
  ) {
    if len >= self.len {
      return;
    }
    let tail = ptr::slice_from_raw_parts_mut(unsafe { self.buf.ptr().add(len) }, self.len - len);
    self.len = len;
    unsafe { ptr::drop_in_place(tail) };
  }

  /// Drops every element, keeping the block.
  pub fn clear(&mut self) {
    self.truncate(0);
  }

  /// Reduces capacity to `len`. If the allocator cannot provide the smaller
  /// block the array is left unchanged.
  pub fn shrink_to_fit(&mut self) {
    if let Err(err) = self.try_shrink_to_fit() {
      tracing::warn!(%err, len = self.len, "shrink_to_fit kept the larger block");
    }
  }

  /// [`shrink_to_fit`](Self::shrink_to_fit), reporting which path was taken.
  /// Returns `None` when there was nothing to do or the block was freed.
  pub fn try_shrink_to_fit(&mut self) -> Result<Option<Relocation>, ArrayError> {
    if self.capacity() == self.len {
      return Ok(None);
    }
    if self.len == 0 {
      self.release_block();
      return Ok(None);
    }
    self.relocate_optional(self.len).map(Some)
  }

  /// Appends `value`.
  pub fn push_back(
    &mut self,
    value: T,
  ) {
    if self.len == self.capacity() {
      self.grow_for(1);
    }
    unsafe { self.buf.ptr().add(self.len).write(value) };
    self.len += 1;
  }

  /// Appends a clone of the element at `index` of this same array.
  ///
  /// # Panics
  ///
  /// When `index >= len`.
  #[track_caller]
  pub fn push_back_from(
    &mut self,
    index: usize,
  ) where
    T: Clone,
  {
    if index >= self.len {
      error::index_out_of_bounds(index, self.len);
    }
    unsafe { self.push_back_from_ptr(self.buf.ptr().add(index)) };
  }

  /// Appends a clone of `*source`, which may point into this array.
  ///
  /// When `source` lies inside the block its slot index is recorded before
  /// the append can relocate the block, and the element is read back by
  /// index afterwards. Other sources are cloned before growing.
  ///
  /// # Safety
  ///
  /// `source` must be valid for reads and point to an initialized `T`.
  /// If it points into this array it must address a slot below `len`.
  #[track_caller]
  pub unsafe fn push_back_from_ptr(
    &mut self,
    source: *const T,
  ) where
    T: Clone,
  {
    let Some(index) = self.buf.slot_of(source) else {
      let value = unsafe { (*source).clone() };
      self.push_back(value);
      return;
    };

    if index >= self.len {
      error::index_out_of_bounds(index, self.len);
    }
    if self.len == self.capacity() {
      self.grow_for(1);
    }
    let value = unsafe { (*self.buf.ptr().add(index)).clone() };
    unsafe { self.buf.ptr().add(self.len).write(value) };
    self.len += 1;
  }

  /// Removes and returns the last element.
  ///
  /// # Panics
  ///
  /// When the array is empty.
  #[track_caller]
  pub fn pop_back(&mut self) -> T {
    match self.try_pop_back() {
      Some(value) => value,
      None => error::empty_array("pop_back"),
    }
  }

  pub fn try_pop_back(&mut self) -> Option<T> {
    if self.len == 0 {
      return None;
    }
    self.len -= 1;
    Some(unsafe { self.buf.ptr().add(self.len).read() })
  }

  /// Inserts `value` at `index`, shifting later elements up.
  ///
  /// # Panics
  ///
  /// When `index > len`.
  #[track_caller]
  pub fn insert(
    &mut self,
    index: usize,
    value: T,
  ) {
    if index > self.len {
      error::index_out_of_bounds(index, self.len);
    }
    if self.len == self.capacity() {
      self.grow_for(1);
    }
    unsafe {
      let slot = self.buf.ptr().add(index);
      ptr::copy(slot, slot.add(1), self.len - index);
      slot.write(value);
    }
    self.len += 1;
  }

  /// Removes the element at `index`, shifting later elements down.
  ///
  /// # Panics
  ///
  /// When `index >= len`.
  #[track_caller]
  pub fn remove(
    &mut self,
    index: usize,
  ) -> T {
    if index >= self.len {
      error::index_out_of_bounds(index, self.len);
    }
    unsafe {
      let slot = self.buf.ptr().add(index);
      let value = slot.read();
      ptr::copy(slot.add(1), slot, self.len - index - 1);
      self.len -= 1;
      value
    }
  }

  /// Removes the element under `cursor`. Cursors into this array stay valid
  /// but now see the shifted elements.
  ///
  /// # Panics
  ///
  /// When `cursor` is invalid for this array or sits at the end.
  #[track_caller]
  pub fn erase(
    &mut self,
    cursor: Cursor,
  ) -> T {
    if let Err(err) = cursor.check(self) {
      error::invalid_cursor(err);
    }
    self.remove(cursor.index())
  }

  /// Removes the element at `index` by moving the last element into its
  /// place. O(1), does not preserve order.
  #[track_caller]
  pub fn swap_remove(
    &mut self,
    index: usize,
  ) -> T {
    if index >= self.len {
      error::index_out_of_bounds(index, self.len);
    }
    let last = self.len - 1;
    self.as_mut_slice().swap(index, last);
    self.len = last;
    unsafe { self.buf.ptr().add(last).read() }
  }

  /// Index of the first element matching `predicate`.
  pub fn position<P>(
    &self,
    predicate: P,
  ) -> Option<usize>
  where
    P: FnMut(&T) -> bool,
  {
    self.as_slice().iter().position(predicate)
  }

  /// Exchanges contents with `other` without touching any element.
  ///
  /// Each array keeps its own identity; cursors into either are invalidated.
  pub fn swap(
    &mut self,
    other: &mut Self,
  ) {
    mem::swap(&mut self.buf, &mut other.buf);
    mem::swap(&mut self.len, &mut other.len);
    mem::swap(&mut self.reserved_hint, &mut other.reserved_hint);
    mem::swap(&mut self.config, &mut other.config);
    self.bump_generation();
    other.bump_generation();
  }

  /// Moves the block out into a new array, leaving `self` empty with
  /// capacity 0. No element is copied.
  pub fn take(&mut self) -> Self
  where
    A: Clone,
  {
    let fresh = RawBuffer::new_in(self.buf.allocator().clone());
    let taken = Self {
      buf: mem::replace(&mut self.buf, fresh),
      len: mem::take(&mut self.len),
      reserved_hint: mem::take(&mut self.reserved_hint),
      config: self.config,
      id: SourceId::next(),
      generation: 0,
    };
    self.bump_generation();
    taken
  }

  /// Growth for `additional` more elements. Allocation failure is fatal.
  #[track_caller]
  fn grow_for(
    &mut self,
    additional: usize,
  ) {
    let Some(required) = self.len.checked_add(additional) else {
      error::capacity_overflow(usize::MAX);
    };
    if required <= self.capacity() {
      return;
    }

    let grown = self
      .config
      .growth
      .apply(self.capacity())
      .max(required)
      .max(self.config.initial_capacity)
      .max(self.reserved_hint);
    let target = match layout::array_bytes::<T>(grown) {
      Ok(_) => grown,
      Err(_) => required,
    };

    self.relocate_required(target);
    self.reserved_hint = 0;
  }

  #[track_caller]
  fn relocate_required(
    &mut self,
    new_capacity: usize,
  ) {
    match self.relocate_optional(new_capacity) {
      Ok(_) => {}
      Err(ArrayError::AllocFailed { .. }) => match Layout::array::<T>(new_capacity) {
        Ok(layout) => handle_alloc_error(layout),
        Err(_) => error::capacity_overflow(new_capacity),
      },
      Err(_) => error::capacity_overflow(new_capacity),
    }
  }

  fn relocate_optional(
    &mut self,
    new_capacity: usize,
  ) -> Result<Relocation, ArrayError> {
    let relocation = unsafe { self.buf.relocate(new_capacity, self.len) }?;
    self.bump_generation();
    Ok(relocation)
  }

  fn release_block(&mut self) {
    debug_assert_eq!(self.len, 0);
    if self.capacity() == 0 {
      return;
    }
    self.buf.release();
    self.bump_generation();
  }

  fn bump_generation(&mut self) {
    self.generation = self.generation.wrapping_add(1);
  }

  /// A fresh, empty array sharing this array's allocator and config.
  fn empty_like(&self) -> Self
  where
    A: Clone,
  {
    let mut array = Self::new_in(self.buf.allocator().clone());
    array.config = self.config;
    array.reserved_hint = self.reserved_hint;
    array
  }

  /// Appends clones of `items` into capacity that is already reserved.
  fn extend_cloned(
    &mut self,
    items: &[T],
  ) where
    T: Clone,
  {
    debug_assert!(self.len + items.len() <= self.capacity());
    for item in items {
      unsafe { self.buf.ptr().add(self.len).write(item.clone()) };
      self.len += 1;
    }
  }
}

impl<T, A: RawAlloc> Drop for DynArray<T, A> {
  fn drop(&mut self) {
    unsafe { ptr::drop_in_place(self.as_mut_slice()) };
  }
}

impl<T: Clone, A: RawAlloc + Clone> Clone for DynArray<T, A> {
  /// Deep copy with the same capacity as `self`.
  fn clone(&self) -> Self {
    let mut copy = self.empty_like();
    if self.capacity() > 0 {
      copy.relocate_required(self.capacity());
    }
    copy.extend_cloned(self.as_slice());
    copy
  }

  /// Reuses the existing block when it is large enough.
  fn clone_from(
    &mut self,
    source: &Self,
  ) {
    self.clear();
    if self.capacity() < source.capacity() {
      self.relocate_required(source.capacity());
    }
    self.config = source.config;
    self.reserved_hint = source.reserved_hint;
    self.extend_cloned(source.as_slice());
  }
}

impl<T, A: RawAlloc + Default> Default for DynArray<T, A> {
  fn default() -> Self {
    Self::new_in(A::default())
  }
}

impl<T, A: RawAlloc> Deref for DynArray<T, A> {
  type Target = [T];

  fn deref(&self) -> &[T] {
    self.as_slice()
  }
}

impl<T, A: RawAlloc> DerefMut for DynArray<T, A> {
  fn deref_mut(&mut self) -> &mut [T] {
    self.as_mut_slice()
  }
}

impl<T, A: RawAlloc> Index<usize> for DynArray<T, A> {
  type Output = T;

  #[track_caller]
  fn index(
    &self,
    index: usize,
  ) -> &T {
    self.at(index)
  }
}

impl<T, A: RawAlloc> IndexMut<usize> for DynArray<T, A> {
  #[track_caller]
  fn index_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    self.at_mut(index)
  }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for DynArray<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.as_slice()).finish()
  }
}

impl<T: PartialEq, A: RawAlloc, B: RawAlloc> PartialEq<DynArray<T, B>> for DynArray<T, A> {
  fn eq(
    &self,
    other: &DynArray<T, B>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq, A: RawAlloc> Eq for DynArray<T, A> {}

impl<T: PartialEq, A: RawAlloc> PartialEq<[T]> for DynArray<T, A> {
  fn eq(
    &self,
    other: &[T],
  ) -> bool {
    self.as_slice() == other
  }
}

impl<T: PartialEq, A: RawAlloc> PartialEq<&[T]> for DynArray<T, A> {
  fn eq(
    &self,
    other: &&[T],
  ) -> bool {
    self.as_slice() == *other
  }
}

impl<T: PartialEq, A: RawAlloc, const N: usize> PartialEq<[T; N]> for DynArray<T, A> {
  fn eq(
    &self,
    other: &[T; N],
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T> {
  /// The result has `capacity == N`.
  fn from(items: [T; N]) -> Self {
    let mut array = Self::with_capacity(N);
    for item in items {
      array.push_back(item);
    }
    array
  }
}

impl<T: Clone> From<&[T]> for DynArray<T> {
  /// The result has `capacity == items.len()`.
  fn from(items: &[T]) -> Self {
    let mut array = Self::with_capacity(items.len());
    array.extend_cloned(items);
    array
  }
}

impl<T> FromIterator<T> for DynArray<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut array = Self::new();
    array.extend(iter);
    array
  }
}

impl<T, A: RawAlloc> Extend<T> for DynArray<T, A> {
  fn extend<I: IntoIterator<Item = T>>(
    &mut self,
    iter: I,
  ) {
    let iter = iter.into_iter();
    let (lower, _) = iter.size_hint();
    if lower > 0 {
      self.grow_for(lower);
    }
    for item in iter {
      self.push_back(item);
    }
  }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a DynArray<T, A> {
  type Item = &'a T;
  type IntoIter = slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_slice().iter()
  }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut DynArray<T, A> {
  type Item = &'a mut T;
  type IntoIter = slice::IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_mut_slice().iter_mut()
  }
}

impl<T, A: RawAlloc> IntoIterator for DynArray<T, A> {
  type Item = T;
  type IntoIter = IntoIter<T, A>;

  fn into_iter(self) -> Self::IntoIter {
    let array = ManuallyDrop::new(self);
    let buf = unsafe { ptr::read(&array.buf) };
    IntoIter::new(buf, array.len)
  }
}
