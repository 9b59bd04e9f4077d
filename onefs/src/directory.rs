//! Directory-entry array operations within a single data block.
//!
//! A directory is, like every other inode in this design, limited to one
//! data block. Its live bytes are a dense, order-preserving array of
//! [`DirEntry`] records; there are never holes, so deletion must shift the
//! tail left by one slot rather than reusing the freed slot in place.

use dataview::DataView;
use onefs_types::{DIR_ENTRY_SIZE, DirEntry, InodeNo};

use crate::{
    error::{Error, Result},
    inode_table,
};

fn entry_count(size: u32) -> usize {
    size as usize / DIR_ENTRY_SIZE
}

/// Returns the inode named `name` inside directory `dd`, or `None` if `dd`
/// is not a directory or has no such entry.
#[must_use]
pub fn directory_lookup(device: &crate::block_device::BlockDevice, dd: InodeNo, name: &str) -> Option<InodeNo> {
    let node = inode_table::get(device, dd);
    if !node.is_directory() {
        return None;
    }
    let count = entry_count(node.size);
    let block = device.block(node.block_no().as_index()?);
    let view = DataView::from(block);
    (0..count)
        .map(|i| view.get::<DirEntry>(i * DIR_ENTRY_SIZE))
        .find(|entry| entry.is_named(name))
        .map(DirEntry::inum)
}

/// Appends `(name, inum)` to directory `dd` and increments `inum`'s
/// reference count. Fails with [`Error::NoSpace`] if the block would
/// overflow.
///
/// This function owns reference-count accounting for directory insertion:
/// callers must not separately adjust `inum`'s `refs` after a successful
/// call (see the design note on `mknod` in the crate-level docs).
pub fn directory_put(
    device: &mut crate::block_device::BlockDevice,
    dd: InodeNo,
    name: &str,
    inum: InodeNo,
) -> Result<()> {
    let size = inode_table::get(device, dd).size;
    let new_size = size as usize + DIR_ENTRY_SIZE;
    if new_size > onefs_params::BLOCK_SIZE {
        return Err(Error::NoSpace);
    }

    let block_index = inode_table::get(device, dd)
        .block_no()
        .as_index()
        .expect("directory without a data block");
    let block = device.block_mut(block_index);
    let entry = DataView::from_mut(block).get_mut::<DirEntry>(size as usize);
    entry.set_name(name);
    entry.set_inum(inum);

    inode_table::get_mut(device, dd).size = u32::try_from(new_size).unwrap();
    inode_table::get_mut(device, inum).refs += 1;

    log::trace!("directory_put: {dd} += {name:?} -> {inum}");
    Ok(())
}

/// Removes the entry named `name` from directory `dd`, decrementing its
/// target's reference count, and shifts the remaining entries left by one
/// slot to keep the array dense. Fails with [`Error::NoEntry`] if absent.
pub fn directory_delete(device: &mut crate::block_device::BlockDevice, dd: InodeNo, name: &str) -> Result<()> {
    let node = inode_table::get(device, dd);
    let count = entry_count(node.size);
    let block_index = node.block_no().as_index().expect("directory without a data block");

    let position = {
        let block = device.block(block_index);
        let view = DataView::from(block);
        (0..count)
            .find(|&i| view.get::<DirEntry>(i * DIR_ENTRY_SIZE).is_named(name))
            .ok_or(Error::NoEntry)?
    };

    let target = {
        let block = device.block(block_index);
        DataView::from(block).get::<DirEntry>(position * DIR_ENTRY_SIZE).inum()
    };

    {
        let block = device.block_mut(block_index);
        for i in position..count - 1 {
            let (lo, hi) = block.split_at_mut((i + 1) * DIR_ENTRY_SIZE);
            let src = DataView::from(&hi[..DIR_ENTRY_SIZE]).get::<DirEntry>(0);
            let src_name = src.name().to_owned();
            let src_inum = src.inum();
            let dst = DataView::from_mut(&mut lo[i * DIR_ENTRY_SIZE..]).get_mut::<DirEntry>(0);
            dst.set_name(&src_name);
            dst.set_inum(src_inum);
        }
    }

    let new_size = u32::try_from((count - 1) * DIR_ENTRY_SIZE).unwrap();
    inode_table::get_mut(device, dd).size = new_size;
    inode_table::decrement_references(device, target);

    log::trace!("directory_delete: {dd} -= {name:?}");
    Ok(())
}

/// Returns the ordered names of every entry in directory `dd`.
#[must_use]
pub fn directory_list(device: &crate::block_device::BlockDevice, dd: InodeNo) -> Option<Vec<String>> {
    let node = inode_table::get(device, dd);
    if !node.is_directory() {
        return None;
    }
    let count = entry_count(node.size);
    let block = device.block(node.block_no().as_index()?);
    let view = DataView::from(block);
    Some(
        (0..count)
            .map(|i| view.get::<DirEntry>(i * DIR_ENTRY_SIZE).name().to_owned())
            .collect(),
    )
}
