//! Compile-time layout constants for the single-file block device.

/// Size of a single block, in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// Total number of blocks in the backing file, including the reserved
/// bitmap block and the inode table.
pub const NUM_BLOCKS: usize = 256;

/// Maximum length of a directory entry name, including the NUL terminator.
pub const DIR_NAME_LENGTH: usize = 60;

/// Index of the reserved block holding the block and inode bitmaps.
pub const BITMAP_BLOCK: usize = 0;

/// Index of the first inode-table block.
pub const INODE_BLOCK_BEGIN: usize = 1;
