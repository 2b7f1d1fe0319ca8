/// Determines what a [`BlockPool`](super::BlockPool) does with blocks that are
/// still allocated when the pool is dropped.
///
/// The pool does not know which blocks hold initialized values, so it never
/// runs element destructors on teardown. Chunk memory is always released.
///
/// # Examples
///
/// ```
/// use allockit::pool::{BlockPool, BlockPoolConfig, DropPolicy};
///
/// let config = BlockPoolConfig {
///     drop_policy: DropPolicy::MustBeEmpty,
///     ..BlockPoolConfig::default()
/// };
/// let mut pool = BlockPool::<u64>::with_config(config)?;
/// let value = pool.construct(7)?;
/// // SAFETY: `value` came from this pool and is destroyed exactly once.
/// unsafe { pool.destroy(value.as_ptr()) };
/// # Ok::<(), allockit::MemoryError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// Live blocks are released with the chunk memory without running `T`'s
    /// destructor. A warning is logged. This is the default.
    #[default]
    LeakLiveBlocks,

    /// The pool panics on drop if any block is still allocated.
    ///
    /// Useful in tests and in code where every element must be destroyed
    /// explicitly before the pool goes away.
    MustBeEmpty,
}
