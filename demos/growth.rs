use std::{cell::Cell, io::Read, ptr};

use rvector::{ArrayConfig, DynArray, GrowthFactor, Libc, RawAlloc, Relocation, dyn_array};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the process with tools like `pmap`,
/// `gdb`, or just follow the trace output between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_array<A: RawAlloc>(
  label: &str,
  array: &DynArray<u32, A>,
) {
  println!(
    "[{}] len = {}, capacity = {}, block = {:?}, generation = {}",
    label,
    array.len(),
    array.capacity(),
    array.as_ptr(),
    array.generation(),
  );
}

/// The C heap, except that `realloc` refuses while `refuse` is set.
#[derive(Default)]
struct Stubborn {
  refuse: Cell<bool>,
}

unsafe impl RawAlloc for Stubborn {
  fn allocate(
    &self,
    bytes: usize,
  ) -> *mut u8 {
    Libc.allocate(bytes)
  }

  unsafe fn reallocate(
    &self,
    block: *mut u8,
    bytes: usize,
  ) -> *mut u8 {
    if self.refuse.get() {
      return ptr::null_mut();
    }
    unsafe { Libc.reallocate(block, bytes) }
  }

  unsafe fn deallocate(
    &self,
    block: *mut u8,
  ) {
    unsafe { Libc.deallocate(block) }
  }
}

fn main() {
  // RUST_LOG=rvector=trace shows every allocation, realloc and fallback copy.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // --------------------------------------------------------------------
  // 1) An empty array owns nothing. The first push allocates one slot.
  // --------------------------------------------------------------------
  let mut array = DynArray::<u32>::new();
  print_array("1: new", &array);
  array.push_back(0xDEAD_BEEF);
  print_array("1: after first push", &array);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Keep pushing and watch the capacity grow by 1.5x each time.
  // --------------------------------------------------------------------
  let mut last = array.capacity();
  for value in 0..40 {
    array.push_back(value);
    if array.capacity() != last {
      last = array.capacity();
      print_array("2: grew", &array);
    }
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) A cursor taken before a relocation is detected as stale.
  // --------------------------------------------------------------------
  let cursor = array.begin();
  println!("\n[3] cursor reads 0x{:X}", cursor.get(&array));
  while array.len() < array.capacity() {
    array.push_back(1);
  }
  array.push_back(2);
  println!("[3] after relocation: {:?}", cursor.check(&array));
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Appending one of the array's own elements while it relocates.
  // --------------------------------------------------------------------
  let mut small = dyn_array![10, 20, 30];
  print_array("4: before", &small);
  small.push_back_from(0);
  print_array("4: after", &small);
  println!("[4] contents = {:?}", small);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) When realloc refuses, growth and shrinking copy into a fresh block.
  // --------------------------------------------------------------------
  let config = ArrayConfig::new().with_growth(GrowthFactor::DOUBLE);
  let mut stubborn = DynArray::with_config_in(config, Stubborn::default());
  stubborn.extend(0..8u32);
  print_array("5: filled", &stubborn);

  stubborn.allocator().refuse.set(true);
  stubborn.push_back(8);
  print_array("5: grew by copying", &stubborn);

  let shrink = stubborn.try_shrink_to_fit();
  println!("[5] shrink_to_fit took {:?}", shrink);
  assert_eq!(shrink, Ok(Some(Relocation::Copied)));
  print_array("5: shrunk", &stubborn);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) clear() keeps the block; resize(0) gives it back.
  // --------------------------------------------------------------------
  array.clear();
  print_array("6: cleared", &array);
  array.resize(0, 0);
  print_array("6: resized to zero", &array);

  println!("\n[6] End of example.");
}
