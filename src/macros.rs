/// Builds a [`DynArray`](crate::DynArray) from a list of elements, or from
/// a value and a count. The result's capacity equals its length.
///
/// # Examples
///
/// ```rust
/// use rvector::dyn_array;
///
/// let listed = dyn_array![1, 3, 5, 7];
/// assert_eq!(listed.len(), 4);
/// assert_eq!(listed.capacity(), 4);
///
/// let filled = dyn_array![0u8; 3];
/// assert_eq!(filled, [0, 0, 0]);
/// ```
#[macro_export]
macro_rules! dyn_array {
  () => {
    $crate::DynArray::new()
  };
  ($value:expr; $count:expr) => {
    $crate::DynArray::from_elem($value, $count)
  };
  ($($item:expr),+ $(,)?) => {
    $crate::DynArray::from([$($item),+])
  };
}

#[cfg(test)]
mod tests {
  use crate::DynArray;

  #[test]
  fn test_dyn_array() {
    let empty: DynArray<i32> = dyn_array![];
    assert_eq!(empty.capacity(), 0);

    let listed = dyn_array![1, 3, 5, 7,];
    assert_eq!(listed, [1, 3, 5, 7]);
    assert_eq!(listed.capacity(), 4);

    let filled = dyn_array![String::from("x"); 2];
    assert_eq!(filled, [String::from("x"), String::from("x")]);

    let none = dyn_array![1u8; 0];
    assert_eq!(none.capacity(), 0);
  }
}
