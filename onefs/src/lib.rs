//! Core of a user-space file system backed by a single host file,
//! memory-mapped as a fixed-size block device.
//!
//! The design is deliberately simple: every file and every directory owns
//! at most one data block (see [`onefs_params::BLOCK_SIZE`]), there is no
//! journaling, and exactly one request is ever in flight at a time. The
//! layers, leaves first:
//!
//! - [`block_device`]: memory-maps the backing file and allocates/frees
//!   individual blocks via a bitmap packed into block 0.
//! - [`inode_table`]: allocation, lookup, and reference-count lifecycle of
//!   fixed-width inode records, packed into the blocks immediately
//!   following the bitmap block.
//! - [`directory`]: the dense directory-entry array living in a
//!   directory's single data block.
//! - [`path`]: walks an absolute, slash-separated path from the root
//!   inode through repeated directory lookups.
//! - [`path_util`]: pure parent/basename/join string helpers with no disk
//!   access.
//! - [`ops`]: the public storage-operations surface ([`Storage::stat`],
//!   [`Storage::read`], [`Storage::write`], ...), which composes the layers
//!   above and enforces permission and error policy.
//!
//! All of this state, the memory map, the bitmaps, the inode table, is
//! gathered into a single [`Storage`] value passed explicitly to every
//! operation, rather than scattered across process-global statics.

pub mod block_device;
pub mod directory;
pub mod error;
pub mod inode_table;
pub mod ops;
pub mod path;
pub mod path_util;
pub mod stat;

use std::path::Path;

use onefs_params::{BITMAP_BLOCK, INODE_BLOCK_BEGIN};
use onefs_types::{InodeNo, NUM_INODE_BLOCKS, ROOT_MODE};

use crate::block_device::BlockDevice;

/// A mounted image: the memory-mapped backing file plus everything needed
/// to interpret it. Every storage operation is a method on this type.
pub struct Storage {
    device: BlockDevice,
}

impl Storage {
    /// Mounts the backing file at `path`, creating and formatting it if it
    /// does not already hold a valid image, or verifying its consistency
    /// if it does.
    ///
    /// # Panics
    ///
    /// Panics if an existing image fails the consistency check; this
    /// indicates on-disk corruption, which this design has no way to
    /// repair.
    pub fn mount(path: &Path) -> std::io::Result<Self> {
        let device = BlockDevice::open(path)?;
        let mut storage = Self { device };

        if storage.device.block_allocated(INODE_BLOCK_BEGIN) {
            storage.verify_consistency();
            log::debug!("mount: existing image at {}", path.display());
        } else {
            storage.init_fresh();
            log::info!("mount: formatted new image at {}", path.display());
        }

        Ok(storage)
    }

    fn init_fresh(&mut self) {
        self.device.mark_block_allocated(BITMAP_BLOCK);

        for expected in INODE_BLOCK_BEGIN..INODE_BLOCK_BEGIN + NUM_INODE_BLOCKS {
            let got = self.device.alloc_block().expect("image too small for inode table");
            assert_eq!(got, expected, "inode table blocks must be contiguous from the start");
        }

        let root = inode_table::alloc(&mut self.device).expect("image too small for root directory");
        assert_eq!(root, InodeNo::ROOT, "root directory must be the first inode allocated");

        let node = inode_table::get_mut(&mut self.device, root);
        node.refs = 1;
        node.mode = ROOT_MODE;

        directory::directory_put(&mut self.device, root, ".", root).expect("root directory has room for .");
        directory::directory_put(&mut self.device, root, "..", root).expect("root directory has room for ..");
    }

    fn verify_consistency(&self) {
        assert!(
            self.device.block_allocated(BITMAP_BLOCK),
            "corrupt image: bitmap block not marked allocated"
        );
        for block in INODE_BLOCK_BEGIN..INODE_BLOCK_BEGIN + NUM_INODE_BLOCKS {
            assert!(
                self.device.block_allocated(block),
                "corrupt image: inode table block {block} not marked allocated"
            );
        }
        assert!(
            inode_table::is_allocated(&self.device, InodeNo::ROOT),
            "corrupt image: root inode not allocated"
        );
        let root = inode_table::get(&self.device, InodeNo::ROOT);
        assert!(root.is_directory(), "corrupt image: root inode is not a directory");
        assert!(
            !root.block_no().is_none() && self.device.block_allocated(root.block_no().as_index().unwrap()),
            "corrupt image: root's data block is not allocated"
        );
    }

    /// Flushes the memory map back to the backing file.
    pub fn flush(&self) -> std::io::Result<()> {
        self.device.flush()
    }
}
