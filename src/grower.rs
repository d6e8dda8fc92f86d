//! Sources of fresh address space.
//!
//! ```text
//!   grow(n) → base of a new extent of n bytes
//!
//!   ┌──────────┬──────────────┬─────────┐
//!   │ extent 1 │   extent 2   │ ext 3   │ ...  → higher addresses
//!   └──────────┴──────────────┴─────────┘
//!
//!   Extents never move, are never returned, and each one starts above
//!   every earlier one. Consecutive extents are usually contiguous, which
//!   is what lets freed blocks from different extents merge.
//! ```

use std::{mem, ptr::NonNull};

#[cfg(unix)]
use libc::{c_void, intptr_t, sbrk};
use log::debug;

use crate::{align, error::AllocError};

/// Extends the heap by a monotonic, non-relocating grant of bytes.
pub trait HeapGrower {
  /// Returns the base of `increment` fresh bytes, placed above every
  /// previously returned extent. On failure nothing has been granted.
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, AllocError>;
}

/// The process data segment, extended with `sbrk(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

#[cfg(unix)]
impl Sbrk {
  /// Current program break, `sbrk(0)`.
  pub fn program_break() -> *mut u8 {
    unsafe { sbrk(0) }.cast()
  }
}

#[cfg(unix)]
impl HeapGrower for Sbrk {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let exhausted = AllocError::AddressSpaceExhausted { requested: increment };
    let delta = intptr_t::try_from(increment).map_err(|_| exhausted)?;

    let address = unsafe { sbrk(delta) };

    if address == usize::MAX as *mut c_void {
      return Err(exhausted);
    }

    debug!("sbrk({}) = {:?}", increment, address);
    NonNull::new(address.cast()).ok_or(exhausted)
  }
}

/// A fixed-capacity buffer handed out front to back.
///
/// Behaves like a private program break: useful for tests and for callers
/// that must not touch the real one. Running past the capacity is reported
/// as exhaustion.
#[derive(Debug)]
pub struct ArenaGrower {
  base: NonNull<u8>,
  words: usize,
  used: usize,
}

impl ArenaGrower {
  pub fn with_capacity(capacity: usize) -> Self {
    let words = align!(capacity) / mem::size_of::<usize>();
    let buffer: Box<[usize]> = vec![0; words].into_boxed_slice();
    let base = NonNull::from(Box::leak(buffer)).cast::<u8>();

    Self { base, words, used: 0 }
  }

  pub fn capacity(&self) -> usize {
    self.words * mem::size_of::<usize>()
  }

  pub fn used(&self) -> usize {
    self.used
  }

  pub fn remaining(&self) -> usize {
    self.capacity() - self.used
  }

  /// True when `ptr` lies inside the part of the arena handed out so far.
  pub fn contains(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    let start = self.base.as_ptr().addr();
    (start..start + self.used).contains(&ptr.as_ptr().addr())
  }
}

impl HeapGrower for ArenaGrower {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if increment > self.remaining() {
      return Err(AllocError::AddressSpaceExhausted { requested: increment });
    }

    let extent = unsafe { self.base.add(self.used) };
    self.used += increment;

    debug!("Arena grew by {} bytes to {}/{}", increment, self.used, self.capacity());
    Ok(extent)
  }
}

impl Drop for ArenaGrower {
  fn drop(&mut self) {
    let buffer = std::ptr::slice_from_raw_parts_mut(self.base.cast::<usize>().as_ptr(), self.words);
    drop(unsafe { Box::from_raw(buffer) });
  }
}
