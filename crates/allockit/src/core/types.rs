//! Common types and constants for memory management

/// Memory alignment requirements
pub mod alignment {
    /// Alignment of owned arena buffers unless configured otherwise
    pub const DEFAULT_BUFFER_ALIGN: usize = 16;

    /// Cache line size for optimal performance
    pub const CACHE_LINE: usize = 64;
}

/// Memory size constants
pub mod size {
    /// 1 Kilobyte
    pub const KB: usize = 1024;

    /// 1 Megabyte
    pub const MB: usize = 1024 * KB;
}
