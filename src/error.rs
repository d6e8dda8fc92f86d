use thiserror::Error;

/// Reasons an allocation can fail.
///
/// Neither variant leaves the allocator in a changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  /// Zero-byte request, or one too large to carry its own header.
  #[error("invalid allocation size")]
  InvalidSize,

  /// The grower refused to extend the heap.
  #[error("address space exhausted while requesting {requested} bytes")]
  AddressSpaceExhausted { requested: usize },
}
