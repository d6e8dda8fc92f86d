use std::ptr::NonNull;

use log::{debug, warn};

#[cfg(unix)]
use crate::grower::Sbrk;
use crate::{
  block::{BlockHeader, HEADER_SIZE},
  error::AllocError,
  free_list::FreeList,
  grower::HeapGrower,
  search::SearchMode,
};

/// A free-list allocator over the process data segment.
#[cfg(unix)]
pub type SbrkAllocator = FreeListAllocator<Sbrk>;

/// A free block as seen from outside the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Address of the block header.
  pub address: usize,
  /// Payload bytes, excluding the header.
  pub size: usize,
}

/// Explicit free-list allocator with first-fit and best-fit placement.
///
/// Holds raw pointers into its heap, so it is neither `Send` nor `Sync`.
/// Memory obtained from the grower is never handed back.
#[derive(Debug)]
pub struct FreeListAllocator<G: HeapGrower> {
  grower: G,
  free_list: FreeList,
  heap_bytes: usize,
}

impl<G: HeapGrower + Default> Default for FreeListAllocator<G> {
  fn default() -> Self {
    Self::with_grower(G::default())
  }
}

#[cfg(unix)]
impl FreeListAllocator<Sbrk> {
  pub fn new() -> Self {
    Self::with_grower(Sbrk)
  }
}

impl<G: HeapGrower> FreeListAllocator<G> {
  pub fn with_grower(grower: G) -> Self {
    Self {
      grower,
      free_list: FreeList::new(),
      heap_bytes: 0,
    }
  }

  pub fn grower(&self) -> &G {
    &self.grower
  }

  pub fn allocate_first_fit(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.allocate(size, SearchMode::FirstFit)
  }

  pub fn allocate_best_fit(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.allocate(size, SearchMode::BestFit)
  }

  /// # Safety
  ///
  /// See [`FreeListAllocator::release`].
  pub unsafe fn release_first_fit(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    unsafe { self.release(ptr) }
  }

  /// # Safety
  ///
  /// See [`FreeListAllocator::release`].
  pub unsafe fn release_best_fit(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    unsafe { self.release(ptr) }
  }

  /// Returns a region of at least `size` bytes, reusing a free block chosen
  /// by `mode` or growing the heap when none fits.
  pub fn allocate(
    &mut self,
    size: usize,
    mode: SearchMode,
  ) -> Result<NonNull<u8>, AllocError> {
    match mode.find(&self.free_list, size) {
      Some(block) => Ok(unsafe { self.allocate_from(block, size) }),
      None => self.grow(size),
    }
  }

  /// Gives a region back to the free list, merging it with any free block
  /// it touches.
  ///
  /// # Safety
  ///
  /// `ptr` must come from an allocation on this allocator and must not
  /// have been released since.
  pub unsafe fn release(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    unsafe {
      let block = BlockHeader::from_payload(ptr);
      self.free_list.insert(block);
      self.free_list.merge(block);
    }
  }

  /// Payload bytes recorded for a live allocation. Can exceed the request
  /// when a whole free block was handed out.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation from this allocator.
  pub unsafe fn capacity_of(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { BlockHeader::size(BlockHeader::from_payload(ptr)) }
  }

  /// Header and payload bytes ever granted by the grower.
  pub fn total_heap_bytes(&self) -> usize {
    self.heap_bytes
  }

  /// Header and payload bytes currently sitting in the free list.
  pub fn total_free_bytes(&self) -> usize {
    self.free_list.free_bytes()
  }

  /// Free blocks in address order.
  pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
    self.free_list.iter().map(|block| FreeBlock {
      address: BlockHeader::address(block),
      size: unsafe { BlockHeader::size(block) },
    })
  }

  /// Hands out `size` bytes from a free block that holds at least that
  /// many. The tail is split off when the rest can still host a header and
  /// some payload; otherwise the whole block leaves the list.
  unsafe fn allocate_from(
    &mut self,
    block: NonNull<BlockHeader>,
    size: usize,
  ) -> NonNull<u8> {
    unsafe {
      let capacity = BlockHeader::size(block);

      if capacity > size + HEADER_SIZE {
        let remaining = capacity - size - HEADER_SIZE;
        BlockHeader::set_size(block, remaining);

        let tail = BlockHeader::payload(block).add(remaining).cast::<BlockHeader>();
        BlockHeader::write(tail, BlockHeader::new(size, None, None));

        debug!("Split {:?}: kept {} bytes, handed out {} at {:?}", block, remaining, size, tail);
        return BlockHeader::payload(tail);
      }

      self.free_list.unlink(block);

      debug!("Handed out whole block {:?} ({} bytes for {})", block, capacity, size);
      BlockHeader::payload(block)
    }
  }

  /// Carves a new allocated block out of fresh address space.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let total = size.checked_add(HEADER_SIZE).ok_or(AllocError::InvalidSize)?;
    let extent = self.grower.grow(total).inspect_err(|err| warn!("Heap growth failed: {}", err))?;

    let block = extent.cast::<BlockHeader>();
    unsafe { BlockHeader::write(block, BlockHeader::new(size, None, None)) };
    self.heap_bytes += total;

    debug!("Grew heap by {} bytes at {:?}, {} bytes total", total, block, self.heap_bytes);
    Ok(unsafe { BlockHeader::payload(block) })
  }
}
