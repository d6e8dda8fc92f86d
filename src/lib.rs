//! # freelist-alloc - An Explicit Free-List Memory Allocator
//!
//! This crate provides a **free-list allocator** that manages memory obtained
//! with the `sbrk` system call (or any other [`HeapGrower`]) and recycles
//! released blocks through an address-ordered, doubly-linked free list.
//!
//! ## Overview
//!
//! ```text
//!   Heap and Free List:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                           HEAP MEMORY                                │
//!   │                                                                      │
//!   │   ┌──────┬──────┬──────┬────────┬──────┬────────────┐                │
//!   │   │ F 30 │ A 64 │ F 10 │  A 128 │ F 50 │   A 200    │                │
//!   │   └──────┴──────┴──────┴────────┴──────┴────────────┘                │
//!   │      │      ▲      │   ▲          │  ▲                      ▲        │
//!   │      └─────────────┘   └──────────┘  │                      │        │
//!   │   head ──►  next ──►     next ──►  (end)                 Program     │
//!   │                                                           Break      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   F = free block (in the list), A = allocated block (not in the list).
//!   The list is kept in address order.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   freelist_alloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block header and pointer helpers
//!   ├── free_list  - Address-ordered insertion, unlinking and merging
//!   ├── search     - SearchMode: first-fit and best-fit placement
//!   ├── grower     - HeapGrower trait, Sbrk and ArenaGrower
//!   ├── error      - AllocError
//!   └── allocator  - FreeListAllocator
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use freelist_alloc::{ArenaGrower, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::with_grower(ArenaGrower::with_capacity(4096));
//!
//! let ptr = allocator.allocate_best_fit(64).unwrap();
//! unsafe {
//!     ptr.as_ptr().write_bytes(0, 64);
//!     allocator.release_best_fit(ptr);
//! }
//!
//! assert_eq!(allocator.total_free_bytes(), allocator.total_heap_bytes());
//! ```
//!
//! ## How It Works
//!
//! Every block carries a header right before its payload:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ prev: free only │  │  │     N bytes usable       │  │
//!   │  │ next: free only │  │  └──────────────────────────┘  │
//!   │  └─────────────────┘  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! Allocation searches the free list with the chosen [`SearchMode`]. When a
//! block is found and has room for another header plus payload, the **tail**
//! is split off and handed out, and the front stays in the list untouched
//! apart from its size:
//!
//! ```text
//!   before:  ┌─H─┬──────────── 200 ────────────┐
//!   after:   ┌─H─┬──── 136 ────┬─H─┬─── 40 ───┐
//!             free (in list)     allocated
//! ```
//!
//! Otherwise the whole block leaves the list. With nothing suitable free, the
//! heap grows by exactly `size + HEADER_SIZE` bytes.
//!
//! Release inserts the block at its address-ordered slot and merges it with
//! the successor, then the predecessor, whenever they touch in memory:
//!
//! ```text
//!   ┌─H─┬─ A ─┬─H─┬─ B ─┬─H─┬─ C ─┐      release B with A, C free
//!   ┌─H─┬────── A + H + B + H + C ─┐      one free block
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Never shrinks**: Released memory is reused, not returned to the OS
//! - **No alignment promise**: Payloads start right after a header and
//!   sizes are not rounded
//! - **Unix-only sbrk**: [`Sbrk`] requires `libc` on POSIX systems;
//!   [`ArenaGrower`] works everywhere
//!
//! ## Safety
//!
//! Allocation is safe. Releasing takes a raw pointer and is `unsafe`: the
//! pointer must come from the same allocator and must not be released twice.

pub mod align;
mod allocator;
mod block;
mod error;
mod free_list;
mod grower;
mod search;

#[cfg(unix)]
pub use allocator::SbrkAllocator;
pub use allocator::{FreeBlock, FreeListAllocator};
pub use block::HEADER_SIZE;
pub use error::AllocError;
#[cfg(unix)]
pub use grower::Sbrk;
pub use grower::{ArenaGrower, HeapGrower};
pub use search::SearchMode;
