use std::{env, io::Read, ptr::NonNull};

use freelist_alloc::{SbrkAllocator, SearchMode, Sbrk};
use log::info;

/// Waits until the user presses ENTER when running with `--step`.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just watch the program break between steps.
fn pause(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    Sbrk::program_break(),
  );
}

fn print_free_list(allocator: &SbrkAllocator) {
  println!(
    "    heap = {} bytes, free = {} bytes",
    allocator.total_heap_bytes(),
    allocator.total_free_bytes()
  );
  for block in allocator.free_blocks() {
    println!("    free block at {:#X}: {} bytes", block.address, block.size);
  }
}

fn allocate(
  allocator: &mut SbrkAllocator,
  mode: SearchMode,
  size: usize,
) -> NonNull<u8> {
  match allocator.allocate(size, mode) {
    Ok(ptr) => {
      info!("allocated {} bytes at {:?}", size, ptr);
      ptr
    },
    Err(err) => {
      eprintln!("allocation of {} bytes failed: {}", size, err);
      std::process::exit(1);
    },
  }
}

fn main() {
  pretty_env_logger::init();

  let mut args = env::args().skip(1);
  let mode = match args.next().as_deref() {
    Some("best") => SearchMode::BestFit,
    _ => SearchMode::FirstFit,
  };
  let step = args.any(|arg| arg == "--step");

  let mut allocator = SbrkAllocator::new();
  println!("Placement policy: {:?}", mode);

  unsafe {
    print_program_break("start");
    pause(step);

    // --------------------------------------------------------------------
    // 1) Three blocks of different sizes, each growing the heap.
    // --------------------------------------------------------------------
    let a = allocate(&mut allocator, mode, 30);
    let separator_a = allocate(&mut allocator, mode, 8);
    let b = allocate(&mut allocator, mode, 10);
    let _separator_b = allocate(&mut allocator, mode, 8);
    let c = allocate(&mut allocator, mode, 50);
    let _separator_c = allocate(&mut allocator, mode, 8);

    println!("\n[1] Allocated 30, 10 and 50 bytes with separators");
    print_program_break("after growth");
    print_free_list(&allocator);
    pause(step);

    // --------------------------------------------------------------------
    // 2) Release them: the separators keep them from merging.
    // --------------------------------------------------------------------
    allocator.release(a);
    allocator.release(b);
    allocator.release(c);

    println!("\n[2] Released the three blocks");
    print_free_list(&allocator);
    pause(step);

    // --------------------------------------------------------------------
    // 3) A 20 byte request: first-fit takes the 30 byte block (lowest
    //    address), best-fit takes it too (smallest that fits).
    // --------------------------------------------------------------------
    let before = allocator.total_heap_bytes();
    let d = allocate(&mut allocator, mode, 20);

    println!("\n[3] Allocated 20 bytes, reused = {}", allocator.total_heap_bytes() == before);
    print_free_list(&allocator);
    pause(step);

    // --------------------------------------------------------------------
    // 4) Releasing the separator next to the 30 byte block lets it merge.
    // --------------------------------------------------------------------
    allocator.release(d);
    allocator.release(separator_a);

    println!("\n[4] Released the 20 byte block and its neighbour");
    print_free_list(&allocator);
    pause(step);

    // --------------------------------------------------------------------
    // 5) A large block to observe heap growth.
    // --------------------------------------------------------------------
    print_program_break("before large alloc");
    let big = allocate(&mut allocator, mode, 64 * 1024);
    big.as_ptr().write_bytes(0xAB, 64 * 1024);
    print_program_break("after large alloc");
    print_free_list(&allocator);

    println!("\n[5] End of demo. The heap is never shrunk; the OS reclaims it at exit.");
  }
}
