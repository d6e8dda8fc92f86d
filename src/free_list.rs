use std::{marker::PhantomData, ptr::NonNull};

use log::{debug, trace};

use crate::block::{BlockHeader, HEADER_SIZE, Link};

/// Address-ordered, doubly-linked list of free blocks.
///
/// Every header reachable from `head` is live and lies in memory granted to
/// the owning allocator. Addresses strictly increase along `next`.
#[derive(Debug, Default)]
pub struct FreeList {
  head: Link,
}

impl FreeList {
  pub fn new() -> Self {
    Self { head: None }
  }

  #[cfg(test)]
  pub fn head(&self) -> Link {
    self.head
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: PhantomData,
    }
  }

  /// Header plus payload bytes currently held by the list.
  pub fn free_bytes(&self) -> usize {
    self.iter().map(|block| HEADER_SIZE + unsafe { BlockHeader::size(block) }).sum()
  }

  /// Links `block` in at its address-ordered position.
  ///
  /// # Safety
  ///
  /// `block` must be an initialized header that is not already in the list.
  pub unsafe fn insert(
    &mut self,
    block: NonNull<BlockHeader>,
  ) {
    unsafe {
      let (prev, next) = self.slot_for(block);

      match (prev, next) {
        (None, None) => {
          BlockHeader::set_prev(block, None);
          BlockHeader::set_next(block, None);
          self.head = Some(block);
        },
        (None, Some(next)) => {
          BlockHeader::set_prev(block, None);
          BlockHeader::set_next(block, Some(next));
          BlockHeader::set_prev(next, Some(block));
          self.head = Some(block);
        },
        (Some(prev), None) => {
          BlockHeader::set_prev(block, Some(prev));
          BlockHeader::set_next(block, None);
          BlockHeader::set_next(prev, Some(block));
        },
        (Some(prev), Some(next)) => {
          BlockHeader::set_prev(block, Some(prev));
          BlockHeader::set_next(block, Some(next));
          BlockHeader::set_next(prev, Some(block));
          BlockHeader::set_prev(next, Some(block));
        },
      }

      debug!("Inserted free block {:?} ({} bytes)", block, BlockHeader::size(block));
    }
  }

  /// Finds the entries `block` belongs between: the last one below it and
  /// the first one above it.
  unsafe fn slot_for(
    &self,
    block: NonNull<BlockHeader>,
  ) -> (Link, Link) {
    let address = BlockHeader::address(block);
    let mut prev: Link = None;
    let mut next: Link = self.head;

    while let Some(current) = next {
      if BlockHeader::address(current) > address {
        break;
      }
      prev = next;
      next = unsafe { BlockHeader::next(current) };
    }

    (prev, next)
  }

  /// Removes `block` from the list, joining its neighbours.
  ///
  /// # Safety
  ///
  /// `block` must currently be in the list.
  pub unsafe fn unlink(
    &mut self,
    block: NonNull<BlockHeader>,
  ) {
    unsafe {
      let BlockHeader { prev, next, .. } = BlockHeader::read(block);

      match prev {
        Some(prev) => BlockHeader::set_next(prev, next),
        None => self.head = next,
      }

      if let Some(next) = next {
        BlockHeader::set_prev(next, prev);
      }

      BlockHeader::set_prev(block, None);
      BlockHeader::set_next(block, None);
    }
  }

  /// Coalesces a freshly inserted `block` with its list neighbours when they
  /// touch it in memory. The successor is tried first so that the
  /// predecessor test sees the enlarged extent.
  ///
  /// # Safety
  ///
  /// `block` must currently be in the list.
  pub unsafe fn merge(
    &mut self,
    block: NonNull<BlockHeader>,
  ) {
    unsafe {
      if let Some(next) = BlockHeader::next(block) {
        if BlockHeader::adjacent(block, next) {
          Self::absorb(block, next);
        }
      }

      if let Some(prev) = BlockHeader::prev(block) {
        if BlockHeader::adjacent(prev, block) {
          Self::absorb(prev, block);
        }
      }
    }
  }

  /// Folds `higher` into `lower`; `higher` stops being a list entry.
  unsafe fn absorb(
    lower: NonNull<BlockHeader>,
    higher: NonNull<BlockHeader>,
  ) {
    unsafe {
      let absorbed = BlockHeader::read(higher);
      let size = BlockHeader::size(lower) + HEADER_SIZE + absorbed.size;

      BlockHeader::set_size(lower, size);
      BlockHeader::set_next(lower, absorbed.next);

      if let Some(after) = absorbed.next {
        BlockHeader::set_prev(after, Some(lower));
      }

      debug!("Merged {:?} into {:?}, now {} bytes", higher, lower, size);
    }
  }
}

/// Walks the free list in address order.
pub struct Iter<'a> {
  current: Link,
  _list: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
  type Item = NonNull<BlockHeader>;

  fn next(&mut self) -> Option<Self::Item> {
    let block = self.current?;
    self.current = unsafe { BlockHeader::next(block) };
    trace!("Visiting free block {:?}", block);
    Some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Lays out blocks back to back in `buffer`. Blocks a test never inserts
  /// act as allocated separators.
  fn carve(
    buffer: &mut [usize],
    sizes: &[usize],
  ) -> Vec<NonNull<BlockHeader>> {
    let base = NonNull::new(buffer.as_mut_ptr()).unwrap().cast::<u8>();
    let mut offset = 0;
    let mut blocks = Vec::new();

    for &size in sizes {
      let block = unsafe { base.add(offset) }.cast::<BlockHeader>();
      unsafe { BlockHeader::write(block, BlockHeader::new(size, None, None)) };
      blocks.push(block);
      offset += HEADER_SIZE + size;
    }

    assert!(offset <= buffer.len() * size_of::<usize>());
    blocks
  }

  fn sizes(list: &FreeList) -> Vec<usize> {
    list.iter().map(|block| unsafe { BlockHeader::size(block) }).collect()
  }

  fn assert_linked(list: &FreeList) {
    let blocks: Vec<_> = list.iter().collect();

    for pair in blocks.windows(2) {
      assert!(BlockHeader::address(pair[0]) < BlockHeader::address(pair[1]));
      assert_eq!(unsafe { BlockHeader::prev(pair[1]) }, Some(pair[0]));
    }

    if let Some(first) = blocks.first() {
      assert_eq!(unsafe { BlockHeader::prev(*first) }, None);
    }
  }

  #[test]
  fn test_insert_keeps_address_order() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 8, 16, 8, 32]);
    let mut list = FreeList::new();

    unsafe {
      // Into empty, after tail, before head.
      list.insert(blocks[2]);
      list.insert(blocks[4]);
      list.insert(blocks[0]);
    }

    assert_eq!(sizes(&list), vec![8, 16, 32]);
    assert_eq!(list.head(), Some(blocks[0]));
    assert_linked(&list);
  }

  #[test]
  fn test_insert_between() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 8, 16, 8, 32]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[0]);
      list.insert(blocks[4]);
      list.insert(blocks[2]);
    }

    assert_eq!(sizes(&list), vec![8, 16, 32]);
    assert_linked(&list);
  }

  #[test]
  fn test_unlink_head_middle_and_tail() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 8, 16, 8, 32]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[0]);
      list.insert(blocks[2]);
      list.insert(blocks[4]);

      list.unlink(blocks[2]);
      assert_eq!(sizes(&list), vec![8, 32]);
      assert_linked(&list);

      list.unlink(blocks[0]);
      assert_eq!(list.head(), Some(blocks[4]));
      assert_linked(&list);

      list.unlink(blocks[4]);
    }

    assert!(list.is_empty());
  }

  #[test]
  fn test_merge_with_successor_then_predecessor() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 16, 24, 8, 8]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[0]);
      list.merge(blocks[0]);
      list.insert(blocks[2]);
      list.merge(blocks[2]);
      list.insert(blocks[4]);
      list.merge(blocks[4]);
      assert_eq!(sizes(&list), vec![8, 24, 8]);

      list.insert(blocks[1]);
      list.merge(blocks[1]);
    }

    assert_eq!(sizes(&list), vec![8 + 16 + 24 + 2 * HEADER_SIZE, 8]);
    assert_eq!(list.head(), Some(blocks[0]));
    assert_linked(&list);
  }

  #[test]
  fn test_merge_ignores_gaps() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 8, 8]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[0]);
      list.insert(blocks[2]);
      list.merge(blocks[2]);
    }

    assert_eq!(sizes(&list), vec![8, 8]);
  }

  #[test]
  fn test_free_bytes() {
    let mut buffer = [0usize; 128];
    let blocks = carve(&mut buffer, &[8, 8, 40]);
    let mut list = FreeList::new();
    assert_eq!(list.free_bytes(), 0);

    unsafe {
      list.insert(blocks[0]);
      list.insert(blocks[2]);
    }

    assert_eq!(list.free_bytes(), 48 + 2 * HEADER_SIZE);
  }
}
