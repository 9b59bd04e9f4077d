//! Allocation, lookup, and reference-count lifecycle of fixed-size inodes.
//!
//! The inode table is simply a fixed range of blocks inside the block
//! device (see [`onefs_params::INODE_BLOCK_BEGIN`]), so every function here
//! borrows the device directly rather than wrapping it in a second owning
//! type (that would force two conflicting borrows of the same
//! [`BlockDevice`] at every call site).

use dataview::DataView;
use onefs_params::INODE_BLOCK_BEGIN;
use onefs_types::{BlockNo, INODE_PER_BLOCK, Inode, InodeBlock, InodeNo, NUM_INODES, bit_clear, bit_get, bit_set};

use crate::block_device::BlockDevice;

fn block_of(ino: InodeNo) -> usize {
    INODE_BLOCK_BEGIN + ino.as_index() / INODE_PER_BLOCK
}

#[must_use]
pub fn is_allocated(device: &BlockDevice, ino: InodeNo) -> bool {
    ino.as_index() < NUM_INODES && bit_get(device.inode_bitmap(), ino.as_index())
}

/// Returns a view of inode `ino`.
///
/// # Panics
///
/// Panics if `ino` is not marked allocated in the inode bitmap; callers
/// must only reach this after a successful lookup or allocation.
#[must_use]
pub fn get(device: &BlockDevice, ino: InodeNo) -> &Inode {
    assert!(is_allocated(device, ino), "get of unallocated inode {ino}");
    let block = device.block(block_of(ino));
    DataView::from(block).get::<InodeBlock>(0).inode(ino)
}

/// Mutable counterpart of [`get`]; same panic condition.
pub fn get_mut(device: &mut BlockDevice, ino: InodeNo) -> &mut Inode {
    assert!(is_allocated(device, ino), "get_mut of unallocated inode {ino}");
    let block = device.block_mut(block_of(ino));
    DataView::from_mut(block).get_mut::<InodeBlock>(0).inode_mut(ino)
}

/// Allocates a free inode slot together with its single data block.
///
/// Returns `None` if no inode slot or no data block is free. The returned
/// inode has `refs == 0`, `size == 0`, `mode == 0`; the caller must set
/// `refs` and `mode` before the inode becomes visible to anything else
/// (typically via [`crate::directory::directory_put`]).
pub fn alloc(device: &mut BlockDevice) -> Option<InodeNo> {
    let index = (0..NUM_INODES).find(|&i| !bit_get(device.inode_bitmap(), i))?;
    let ino = InodeNo::new(u32::try_from(index).unwrap());

    let block = device.alloc_block()?;
    bit_set(device.inode_bitmap_mut(), index);

    let node = get_mut(device, ino);
    node.refs = 0;
    node.mode = 0;
    node.size = 0;
    node.set_block_no(BlockNo::new(i32::try_from(block).unwrap()));

    log::debug!("inode_table: allocated inode {ino} with block {block}");
    Some(ino)
}

/// Frees inode `ino`'s data block and clears its bitmap bit.
///
/// # Panics
///
/// Panics if `ino` is not currently allocated.
pub fn free(device: &mut BlockDevice, ino: InodeNo) {
    let block = get(device, ino).block_no();
    if let Some(index) = block.as_index() {
        device.free_block(index);
    }
    bit_clear(device.inode_bitmap_mut(), ino.as_index());
    log::debug!("inode_table: freed inode {ino}");
}

/// Decrements `refs`; frees the inode when the count reaches zero.
///
/// # Panics
///
/// Panics if `refs` is already zero (a double-decrement is an invariant
/// violation, not a reportable error).
pub fn decrement_references(device: &mut BlockDevice, ino: InodeNo) {
    let node = get_mut(device, ino);
    assert!(node.refs > 0, "decrement of inode {ino} with refs == 0");
    node.refs -= 1;
    let refs = node.refs;
    log::trace!("inode_table: inode {ino} refs -> {refs}");
    if refs == 0 {
        free(device, ino);
    }
}

/// Increases `size`. `size` must not shrink and must not exceed
/// `BLOCK_SIZE`; out-of-range requests are a programming error, not
/// something callers recover from.
pub fn grow(device: &mut BlockDevice, ino: InodeNo, size: u32) {
    let node = get_mut(device, ino);
    assert!(size >= node.size && (size as usize) <= onefs_params::BLOCK_SIZE);
    node.size = size;
}

/// Decreases `size`. Zero-filling the bytes that become unreachable is the
/// caller's responsibility; this only updates the metadata.
pub fn shrink(device: &mut BlockDevice, ino: InodeNo, size: u32) {
    let node = get_mut(device, ino);
    assert!(size <= node.size);
    node.size = size;
}
