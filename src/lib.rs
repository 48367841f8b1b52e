//! # rvector - A Dynamic Array over Raw Memory
//!
//! This crate provides [`DynArray`], a growable, contiguous, random-access
//! container built directly on `malloc`, `realloc` and `free`, together with
//! [`Cursor`], a position marker that detects when the array has moved its
//! storage out from under it.
//!
//! ## Overview
//!
//! ```text
//!   DynArray<T> Layout:
//!
//!   ┌──────────────────────┐
//!   │ DynArray             │
//!   │  ┌────────────────┐  │      ┌─────┬─────┬─────┬─────┬───────────────┐
//!   │  │ buf.ptr   ─────┼──┼─────►│ e0  │ e1  │ e2  │ e3  │  uninit slots │
//!   │  │ buf.capacity: 8│  │      └─────┴─────┴─────┴─────┴───────────────┘
//!   │  │ len: 4         │  │      ◄──────── len ────────►
//!   │  │ generation: 3  │  │      ◄──────────────── capacity ──────────────►
//!   │  └────────────────┘  │
//!   └──────────────────────┘
//! ```
//!
//! Appending to a full array multiplies the capacity by the configured
//! growth factor (1.5 by default), so a run of N appends copies O(N)
//! elements in total.
//!
//! ## Crate Structure
//!
//! ```text
//!   rvector
//!   ├── alloc      - RawAlloc trait and the libc allocator
//!   ├── layout     - Block sizes and the malloc alignment guarantee
//!   ├── raw        - RawBuffer: owned block, realloc with copy fallback (internal)
//!   ├── array      - DynArray implementation
//!   ├── cursor     - Cursor and SourceId
//!   ├── into_iter  - Owning iterator
//!   ├── config     - ArrayConfig, GrowthFactor and policies
//!   ├── error      - ArrayError and ConfigError
//!   └── macros     - dyn_array!
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rvector::{DynArray, dyn_array};
//!
//! let mut array = DynArray::new();
//! array.push_back(10);
//! array.push_back(20);
//! assert_eq!(array[1], 20);
//!
//! let cursor = array.begin();
//! assert_eq!(*cursor.get(&array), 10);
//!
//! // Growing past the capacity relocates the block...
//! while array.len() < array.capacity() {
//!     array.push_back(0);
//! }
//! array.push_back(30);
//!
//! // ...and the old cursor knows it.
//! assert!(!cursor.is_valid(&array));
//!
//! assert_eq!(dyn_array![1, 2, 3], [1, 2, 3]);
//! ```
//!
//! ## How It Works
//!
//! Growth, shrinking and explicit reservations all go through one
//! relocation routine:
//!
//! ```text
//!   relocate(new_capacity):
//!
//!   realloc(block, bytes) ──ok──► adopt returned block
//!          │
//!        null
//!          ▼
//!   malloc(bytes) ──ok──► copy len elements, free(old), adopt new block
//!          │
//!        null
//!          ▼
//!   required path (push, insert, grow): handle_alloc_error
//!   optional path (reserve, shrink):    keep the old block, nothing changes
//! ```
//!
//! Each relocation bumps the array's generation. A [`Cursor`] records the
//! array identity, capacity and generation when it is taken and compares
//! them on every use, so a stale cursor panics instead of reading freed
//! memory.
//!
//! Appending an element of the array to itself is handled by
//! [`DynArray::push_back_from`]: the source index is captured before the
//! block can move and re-read afterwards.
//!
//! ## Contract Violations
//!
//! Out-of-bounds indexing, popping an empty array, and dereferencing or
//! stepping an invalid or end cursor panic. There is no clamping and no
//! wraparound.
//!
//! ## Limitations
//!
//! - **Single-threaded use**: no internal synchronization
//! - **No zero-sized types**: rejected at compile time
//! - **Alignment**: element alignment must not exceed what `malloc` provides
//! - **Unix-oriented**: memory comes from `libc`

mod alloc;
mod array;
pub mod config;
mod cursor;
pub mod error;
mod into_iter;
pub mod layout;
mod macros;
mod raw;

pub use alloc::{Libc, RawAlloc};
pub use array::DynArray;
pub use config::{ArrayConfig, GrowthFactor, ReservePolicy, ZeroResize};
pub use cursor::{Cursor, SourceId};
pub use error::{ArrayError, ConfigError};
pub use into_iter::IntoIter;
pub use raw::Relocation;
