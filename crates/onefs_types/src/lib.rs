//! On-disk data types for the single-file block device.
//!
//! The data layout:
//!
//! | block no.                              | # of blocks   | content      | type          |
//! |-----------------------------------------|---------------|--------------|---------------|
//! | 0                                       | 1             | bitmaps      | block + inode |
//! | [`onefs_params::INODE_BLOCK_BEGIN`]     | `NIB`         | inode table  | [`InodeBlock`]|
//! | `INODE_BLOCK_BEGIN + NIB`               | remainder     | data blocks  | `[u8; BLOCK_SIZE]` |

use std::fmt;

use dataview::{Pod, PodMethods as _};
use onefs_params::{BLOCK_SIZE, DIR_NAME_LENGTH, NUM_BLOCKS};

/// No block is allocated.
pub const NO_BLOCK: i32 = -1;

/// Block number, or [`NO_BLOCK`] if unallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Pod)]
#[repr(transparent)]
pub struct BlockNo(i32);

impl fmt::Display for BlockNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BlockNo {
    pub const NONE: Self = Self(NO_BLOCK);

    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self(n)
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == NO_BLOCK
    }

    #[must_use]
    pub fn as_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// Inode number. Index 0 is always the root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Pod, Hash)]
#[repr(transparent)]
pub struct InodeNo(u32);

impl fmt::Display for InodeNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl InodeNo {
    pub const ROOT: Self = Self::new(0);

    #[must_use]
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_index(self) -> usize {
        usize::try_from(self.0).unwrap()
    }
}

/// High octal digit of [`Inode::mode`] that marks a directory.
pub const MODE_TYPE_DIR: u32 = 4;

/// Default mode assigned to the root directory on first mount.
pub const ROOT_MODE: u32 = 0o040_755;

/// A fixed-width on-disk inode record.
///
/// Every inode owns at most one data block; there is no indirection.
#[derive(Debug, Pod)]
#[repr(C)]
pub struct Inode {
    /// Hard-link / reference count. Zero means the slot is free.
    pub refs: i32,
    /// High octal digit is the type (`4` = directory, else regular file);
    /// remaining digits are standard `ttt uuu ggg ooo` permission bits.
    pub mode: u32,
    /// Occupied bytes of the data block, in `[0, BLOCK_SIZE]`.
    pub size: u32,
    /// Index of the single owned data block, or [`NO_BLOCK`].
    pub block: i32,
}

impl Inode {
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.refs == 0
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.mode / 0o10_000 == MODE_TYPE_DIR
    }

    #[must_use]
    pub fn block_no(&self) -> BlockNo {
        BlockNo::new(self.block)
    }

    pub fn set_block_no(&mut self, block: BlockNo) {
        self.block = block.value();
    }

    /// Owner permission triad (`rwx` as bits `4`, `2`, `1`).
    #[must_use]
    pub fn owner_permissions(&self) -> u32 {
        let type_digit = self.mode / 0o10_000;
        (self.mode - type_digit * 0o10_000) / 0o100 & 0o7
    }

    #[must_use]
    pub fn owner_can_read(&self) -> bool {
        self.owner_permissions() & 0o4 != 0
    }

    #[must_use]
    pub fn owner_can_write(&self) -> bool {
        self.owner_permissions() & 0o2 != 0
    }
}

/// Inodes packed per table block.
pub const INODE_PER_BLOCK: usize = BLOCK_SIZE / size_of::<Inode>();

/// Maximum number of inodes the image can hold. One inode can own at most
/// one data block, so sizing the inode count to the block count is always
/// sufficient.
pub const NUM_INODES: usize = NUM_BLOCKS;

/// Number of blocks reserved for the inode table.
pub const NUM_INODE_BLOCKS: usize = NUM_INODES.div_ceil(INODE_PER_BLOCK);

#[derive(Pod)]
#[repr(transparent)]
pub struct InodeBlock([Inode; INODE_PER_BLOCK]);

impl InodeBlock {
    #[must_use]
    pub fn inode(&self, ino: InodeNo) -> &Inode {
        &self.0[ino.as_index() % INODE_PER_BLOCK]
    }

    #[must_use]
    pub fn inode_mut(&mut self, ino: InodeNo) -> &mut Inode {
        &mut self.0[ino.as_index() % INODE_PER_BLOCK]
    }
}

/// Bits addressable per bitmap block.
pub const BITS_PER_BLOCK: usize = BLOCK_SIZE * 8;

/// Reads bit `n` of a packed bit array.
#[must_use]
pub fn bit_get(bytes: &[u8], n: usize) -> bool {
    bytes[n / 8] & (1 << (n % 8)) != 0
}

/// Sets bit `n` of a packed bit array.
pub fn bit_set(bytes: &mut [u8], n: usize) {
    bytes[n / 8] |= 1 << (n % 8);
}

/// Clears bit `n` of a packed bit array.
pub fn bit_clear(bytes: &mut [u8], n: usize) {
    bytes[n / 8] &= !(1 << (n % 8));
}

/// A fixed-width directory entry: a NUL-terminated name plus the inode it
/// names. Directories are dense arrays of these with no holes.
#[repr(C)]
#[derive(Debug, Pod)]
pub struct DirEntry {
    inum: u32,
    name: [u8; DIR_NAME_LENGTH],
}

impl DirEntry {
    #[must_use]
    pub fn inum(&self) -> InodeNo {
        InodeNo::new(self.inum)
    }

    pub fn set_inum(&mut self, inum: InodeNo) {
        self.inum = inum.value();
    }

    #[must_use]
    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name() == name
    }

    /// Writes `name` into the entry. The caller must have already checked
    /// `name.len() < DIR_NAME_LENGTH`.
    pub fn set_name(&mut self, name: &str) {
        assert!(name.len() < DIR_NAME_LENGTH);
        self.name.fill(0);
        self.name[..name.len()].copy_from_slice(name.as_bytes());
    }
}

/// Size in bytes of a single directory entry on disk.
pub const DIR_ENTRY_SIZE: usize = size_of::<DirEntry>();

const _: () = const {
    assert!(BLOCK_SIZE % size_of::<Inode>() == 0);
    assert!(BLOCK_SIZE % size_of::<DirEntry>() == 0);
};
