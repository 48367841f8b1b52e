use std::{fmt, ptr, slice};

use crate::{alloc::RawAlloc, raw::RawBuffer};

/// Owning iterator returned by `DynArray::into_iter`.
///
/// Elements not yielded are dropped with the iterator, then the block is
/// freed.
pub struct IntoIter<T, A: RawAlloc> {
  buf: RawBuffer<T, A>,
  start: usize,
  end: usize,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
  pub(crate) fn new(
    buf: RawBuffer<T, A>,
    len: usize,
  ) -> Self {
    Self { buf, start: 0, end: len }
  }

  /// Elements not yet yielded.
  pub fn as_slice(&self) -> &[T] {
    if self.start == self.end {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.buf.ptr().add(self.start), self.end - self.start) }
  }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    if self.start == self.end {
      return None;
    }
    let value = unsafe { self.buf.ptr().add(self.start).read() };
    self.start += 1;
    Some(value)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = self.end - self.start;
    (remaining, Some(remaining))
  }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
  fn next_back(&mut self) -> Option<T> {
    if self.start == self.end {
      return None;
    }
    self.end -= 1;
    Some(unsafe { self.buf.ptr().add(self.end).read() })
  }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for IntoIter<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
  }
}

impl<T, A: RawAlloc> Drop for IntoIter<T, A> {
  fn drop(&mut self) {
    if self.start == self.end {
      return;
    }
    let rest = ptr::slice_from_raw_parts_mut(unsafe { self.buf.ptr().add(self.start) }, self.end - self.start);
    self.start = self.end;
    unsafe { ptr::drop_in_place(rest) };
  }
}

#[cfg(test)]
mod tests {
  use crate::dyn_array;

  #[test]
  fn yields_in_order() {
    let array = dyn_array![String::from("a"), String::from("b"), String::from("c")];

    let collected: Vec<String> = array.into_iter().collect();

    assert_eq!(collected, ["a", "b", "c"]);
  }

  #[test]
  fn meets_in_the_middle() {
    let mut iter = dyn_array![1, 2, 3].into_iter();

    assert_eq!(iter.next_back(), Some(3));
    assert_eq!(iter.as_slice(), &[1, 2]);
    assert_eq!(iter.next(), Some(1));
    assert_eq!(iter.next(), Some(2));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);
  }

  #[test]
  fn empty_array_yields_nothing() {
    let array = crate::DynArray::<u8>::new();

    assert_eq!(array.into_iter().count(), 0);
  }
}
