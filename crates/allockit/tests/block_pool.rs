//! Integration tests for BlockPool

use allockit::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_pool_grows_to_second_chunk() {
    let mut pool = BlockPool::<i32>::with_chunk_size(4).expect("Failed to create block pool");

    let ptrs: Vec<_> = (0..5)
        .map(|i| pool.construct(i).expect("Allocation failed"))
        .collect();

    assert_eq!(pool.chunk_count(), 2);
    assert_eq!(pool.total_blocks(), 8);
    assert_eq!(pool.used_blocks(), 5);
    assert_eq!(pool.utilization(), 0.625);

    for ptr in ptrs {
        // SAFETY: each pointer was constructed above and is destroyed once.
        unsafe { pool.destroy(ptr.as_ptr()) };
    }
    assert_eq!(pool.used_blocks(), 0);
}

#[test]
fn test_pool_values_survive_growth() {
    let mut pool = BlockPool::<u64>::with_chunk_size(3).expect("Failed to create block pool");

    let ptrs: Vec<_> = (0..50_u64)
        .map(|i| pool.construct(i * 7).expect("Allocation failed"))
        .collect();

    assert_eq!(pool.chunk_count(), 17);
    for (i, ptr) in ptrs.iter().enumerate() {
        // SAFETY: pointers stay valid across growth until released.
        assert_eq!(unsafe { *ptr.as_ptr() }, i as u64 * 7);
    }

    // All blocks are distinct
    let mut addrs: Vec<_> = ptrs.iter().map(|p| p.as_ptr() as usize).collect();
    addrs.sort_unstable();
    addrs.dedup();
    assert_eq!(addrs.len(), 50);

    for ptr in ptrs {
        // SAFETY: released once.
        unsafe { pool.deallocate(ptr.as_ptr()) };
    }
}

#[test]
fn test_pool_reuses_freed_block() {
    let mut pool = BlockPool::<[u8; 64]>::with_chunk_size(16).expect("Failed to create block pool");

    let first = pool.allocate().expect("First allocation failed");
    let addr = first.as_ptr() as usize;
    // SAFETY: `first` is live and released once.
    unsafe { pool.deallocate(first.as_ptr()) };

    let second = pool.allocate().expect("Second allocation failed");
    assert_eq!(addr, second.as_ptr() as usize, "Pool should reuse freed blocks");
    // SAFETY: released once.
    unsafe { pool.deallocate(second.as_ptr()) };
}

#[test]
fn test_pool_conservation_with_interleaving() {
    let mut pool = BlockPool::<u32>::with_chunk_size(5).expect("Failed to create block pool");
    let mut live = Vec::new();

    for round in 0..20_u32 {
        for i in 0..3 {
            live.push(pool.construct(round * 10 + i).expect("Allocation failed"));
        }
        if round % 2 == 0 {
            let ptr = live.swap_remove(0);
            // SAFETY: removed from `live`, destroyed once.
            unsafe { pool.destroy(ptr.as_ptr()) };
        }
        assert_eq!(pool.used_blocks() + pool.free_list_len(), pool.total_blocks());
        assert_eq!(pool.free_list_len(), pool.free_blocks());
    }

    for ptr in live {
        // SAFETY: remaining live values, destroyed once.
        unsafe { pool.destroy(ptr.as_ptr()) };
    }
    assert_eq!(pool.free_list_len(), pool.total_blocks());
}

#[test]
fn test_bounded_pool_recovers_after_release() {
    let config = BlockPoolConfig {
        max_chunks: Some(2),
        ..BlockPoolConfig::default().with_blocks_per_chunk(2)
    };
    let mut pool = BlockPool::<String>::with_config(config).expect("Failed to create block pool");

    let ptrs: Vec<_> = (0..4)
        .map(|i| pool.construct(i.to_string()).expect("Allocation failed"))
        .collect();

    let err = pool.construct("overflow".into()).unwrap_err();
    assert_eq!(err.code(), "MEM:POOL:EXHAUSTED");
    assert!(err.is_retryable());

    // SAFETY: destroyed once.
    unsafe { pool.destroy(ptrs[0].as_ptr()) };
    let again = pool.construct("fits".into()).expect("Allocation after release failed");
    // SAFETY: `again` holds a live String.
    assert_eq!(unsafe { again.as_ref() }, "fits");

    for ptr in ptrs.into_iter().skip(1).chain([again]) {
        // SAFETY: every remaining value destroyed once.
        unsafe { pool.destroy(ptr.as_ptr()) };
    }
}

#[test]
fn test_debug_preset_catches_leaks() {
    let result = std::panic::catch_unwind(|| {
        let mut pool = BlockPool::<u8>::debug().expect("Failed to create block pool");
        let _leaked = pool.allocate().expect("Allocation failed");
    });
    assert!(result.is_err());
    assert_eq!(BlockPoolConfig::debug().drop_policy, DropPolicy::MustBeEmpty);
}

#[test]
fn test_production_preset_preallocates() {
    let pool = BlockPool::<u64>::production().expect("Failed to create block pool");
    assert_eq!(pool.chunk_count(), 1);
    assert_eq!(pool.total_blocks(), pool.blocks_per_chunk());
    assert!(!pool.statistics_enabled());
}

#[test]
fn test_pool_memory_usage() {
    let mut pool = BlockPool::<u64>::with_chunk_size(4).expect("Failed to create block pool");
    let ptr = pool.allocate().expect("Allocation failed");

    let block = pool.block_size();
    assert!(block >= size_of::<u64>());
    assert_eq!(pool.used_memory(), block);
    assert_eq!(pool.total_memory(), Some(4 * block));
    assert_eq!(pool.memory_usage_percent(), Some(25.0));

    // SAFETY: released once.
    unsafe { pool.deallocate(ptr.as_ptr()) };
}

#[test]
fn test_pool_is_send() {
    fn assert_send<S: Send>(_: &S) {}

    let mut pool = BlockPool::<u64>::with_chunk_size(4).expect("Failed to create block pool");
    assert_send(&pool);

    let ptr = pool.construct(9).expect("Allocation failed");
    let addr = ptr.as_ptr() as usize;
    let pool = std::thread::spawn(move || {
        // SAFETY: the pool moved here, so the address is still ours to free.
        unsafe { pool.destroy(addr as *mut u64) };
        pool
    })
    .join()
    .expect("worker panicked");
    assert!(pool.is_empty());
}
