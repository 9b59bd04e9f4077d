//! Memory-maps a fixed-size host file as an array of equal-sized blocks.

use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

use memmap2::MmapMut;
use onefs_params::{BITMAP_BLOCK, BLOCK_SIZE, NUM_BLOCKS};
use onefs_types::{bit_clear, bit_get, bit_set};

/// The backing file, mapped read-write for the lifetime of the mount.
pub struct BlockDevice {
    mmap: MmapMut,
}

impl BlockDevice {
    /// Opens `path`, creating it if necessary, extends it to the full image
    /// size, and maps it into memory.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Self::from_file(file)
    }

    fn from_file(file: File) -> io::Result<Self> {
        let image_len = (NUM_BLOCKS * BLOCK_SIZE) as u64;
        if file.metadata()?.len() < image_len {
            file.set_len(image_len)?;
        }
        // SAFETY: the file is exclusively owned by this `BlockDevice` for the
        // duration of the mapping; nothing else truncates or writes to it
        // out from under the map.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { mmap })
    }

    /// Flushes all dirty pages back to the backing file.
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    #[must_use]
    pub fn block(&self, index: usize) -> &[u8] {
        let start = index * BLOCK_SIZE;
        &self.mmap[start..start + BLOCK_SIZE]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * BLOCK_SIZE;
        &mut self.mmap[start..start + BLOCK_SIZE]
    }

    #[must_use]
    pub fn block_bitmap(&self) -> &[u8] {
        &self.block(BITMAP_BLOCK)[..NUM_BLOCKS.div_ceil(8)]
    }

    pub fn block_bitmap_mut(&mut self) -> &mut [u8] {
        let len = NUM_BLOCKS.div_ceil(8);
        &mut self.block_mut(BITMAP_BLOCK)[..len]
    }

    #[must_use]
    pub fn inode_bitmap(&self) -> &[u8] {
        let block_bits = NUM_BLOCKS.div_ceil(8);
        let inode_bits = onefs_types::NUM_INODES.div_ceil(8);
        &self.block(BITMAP_BLOCK)[block_bits..block_bits + inode_bits]
    }

    pub fn inode_bitmap_mut(&mut self) -> &mut [u8] {
        let block_bits = NUM_BLOCKS.div_ceil(8);
        let inode_bits = onefs_types::NUM_INODES.div_ceil(8);
        &mut self.block_mut(BITMAP_BLOCK)[block_bits..block_bits + inode_bits]
    }

    /// Scans the block bitmap for the first free block, marks it allocated,
    /// and returns its index. Returns `None` if the device is full.
    pub fn alloc_block(&mut self) -> Option<usize> {
        let bitmap = self.block_bitmap();
        let index = (0..NUM_BLOCKS).find(|&i| !bit_get(bitmap, i))?;
        bit_set(self.block_bitmap_mut(), index);
        log::trace!("alloc_block: allocated block {index}");
        Some(index)
    }

    pub fn free_block(&mut self, index: usize) {
        debug_assert!(bit_get(self.block_bitmap(), index), "double free of block {index}");
        bit_clear(self.block_bitmap_mut(), index);
        self.block_mut(index).fill(0);
        log::trace!("free_block: freed block {index}");
    }

    #[must_use]
    pub fn block_allocated(&self, index: usize) -> bool {
        bit_get(self.block_bitmap(), index)
    }

    pub fn mark_block_allocated(&mut self, index: usize) {
        bit_set(self.block_bitmap_mut(), index);
    }

    /// Ceiling division of a byte count into whole blocks.
    #[must_use]
    pub fn bytes_to_blocks(n: usize) -> usize {
        n.div_ceil(BLOCK_SIZE)
    }
}
