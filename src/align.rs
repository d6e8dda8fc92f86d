/// Rounds `$value` up to the next multiple of the machine word.
///
/// Block headers are sized with this so that a header placed at a word
/// boundary ends at one as well.
///
/// # Examples
///
/// ```rust
/// use freelist_alloc::align;
///
/// match core::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `$value` up to the next multiple of `$align`, which must be a
/// power of two.
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
