use std::{mem, ptr::NonNull};

use crate::align;

/// Link between free blocks. Only meaningful while the block sits in the
/// free list.
pub type Link = Option<NonNull<BlockHeader>>;

/// Metadata stored immediately before every payload, free or allocated.
///
/// Payload sizes are kept exactly as requested, so a header is not always
/// word aligned in memory. Every access therefore goes through the
/// unaligned helpers below instead of through references.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
  pub size: usize,
  pub prev: Link,
  pub next: Link,
}

/// Bytes reserved in front of every payload.
pub const HEADER_SIZE: usize = align!(mem::size_of::<BlockHeader>());

impl BlockHeader {
  pub fn new(
    size: usize,
    prev: Link,
    next: Link,
  ) -> Self {
    Self { size, prev, next }
  }

  /// # Safety
  ///
  /// `block` must point to `HEADER_SIZE` writable bytes.
  pub unsafe fn write(
    block: NonNull<Self>,
    header: Self,
  ) {
    unsafe { block.as_ptr().write_unaligned(header) }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn read(block: NonNull<Self>) -> Self {
    unsafe { block.as_ptr().read_unaligned() }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn size(block: NonNull<Self>) -> usize {
    unsafe { (&raw const (*block.as_ptr()).size).read_unaligned() }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn set_size(
    block: NonNull<Self>,
    size: usize,
  ) {
    unsafe { (&raw mut (*block.as_ptr()).size).write_unaligned(size) }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn prev(block: NonNull<Self>) -> Link {
    unsafe { (&raw const (*block.as_ptr()).prev).read_unaligned() }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn set_prev(
    block: NonNull<Self>,
    prev: Link,
  ) {
    unsafe { (&raw mut (*block.as_ptr()).prev).write_unaligned(prev) }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn next(block: NonNull<Self>) -> Link {
    unsafe { (&raw const (*block.as_ptr()).next).read_unaligned() }
  }

  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn set_next(
    block: NonNull<Self>,
    next: Link,
  ) {
    unsafe { (&raw mut (*block.as_ptr()).next).write_unaligned(next) }
  }

  /// First byte handed to the caller.
  ///
  /// # Safety
  ///
  /// `block` must be the start of a block inside a granted extent.
  pub unsafe fn payload(block: NonNull<Self>) -> NonNull<u8> {
    unsafe { block.cast::<u8>().add(HEADER_SIZE) }
  }

  /// Recovers the header that owns `payload`.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`BlockHeader::payload`].
  pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<Self> {
    unsafe { payload.sub(HEADER_SIZE).cast() }
  }

  pub fn address(block: NonNull<Self>) -> usize {
    block.as_ptr().addr()
  }

  /// One past the last payload byte of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn end(block: NonNull<Self>) -> usize {
    Self::address(block) + HEADER_SIZE + unsafe { Self::size(block) }
  }

  /// True when `higher` starts exactly where `lower` ends.
  ///
  /// # Safety
  ///
  /// `lower` must point to an initialized header.
  pub unsafe fn adjacent(
    lower: NonNull<Self>,
    higher: NonNull<Self>,
  ) -> bool {
    unsafe { Self::end(lower) == Self::address(higher) }
  }
}
