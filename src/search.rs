use std::ptr::NonNull;

use log::trace;

use crate::{
  block::{BlockHeader, Link},
  free_list::FreeList,
};

/// Placement policy used to pick a free block for a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
  /// First block, in address order, large enough for the request.
  #[default]
  FirstFit,
  /// Smallest block large enough for the request. An exact match ends the
  /// scan; among equal candidates the lowest address wins.
  BestFit,
}

impl SearchMode {
  /// Picks a free block able to hold `size` payload bytes. A zero-byte
  /// request never matches.
  pub(crate) fn find(
    self,
    free_list: &FreeList,
    size: usize,
  ) -> Link {
    if size == 0 {
      return None;
    }

    let found = match self {
      SearchMode::FirstFit => first_fit(free_list, size),
      SearchMode::BestFit => best_fit(free_list, size),
    };

    trace!("{:?} for {} bytes found {:?}", self, size, found);
    found
  }
}

fn first_fit(
  free_list: &FreeList,
  size: usize,
) -> Link {
  free_list.iter().find(|&block| unsafe { BlockHeader::size(block) } >= size)
}

fn best_fit(
  free_list: &FreeList,
  size: usize,
) -> Link {
  let mut best: Option<(NonNull<BlockHeader>, usize)> = None;

  for block in free_list.iter() {
    let capacity = unsafe { BlockHeader::size(block) };

    if capacity == size {
      return Some(block);
    }

    if capacity > size && best.is_none_or(|(_, smallest)| capacity < smallest) {
      best = Some((block, capacity));
    }
  }

  best.map(|(block, _)| block)
}
