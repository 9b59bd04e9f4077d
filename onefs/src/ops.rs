//! The public storage-operations surface: the only API an embedding
//! application (a FUSE callback adapter, a test harness, ...) needs.

use onefs_params::{BLOCK_SIZE, DIR_NAME_LENGTH};
use onefs_types::DIR_ENTRY_SIZE;

use crate::{
    Storage,
    directory::{directory_delete, directory_list, directory_lookup, directory_put},
    error::{Error, Result},
    inode_table,
    path::tree_lookup,
    path_util::{basename_of, parent_of},
    stat::Stat,
};

impl Storage {
    /// Fills in `Stat` for `path`.
    pub fn stat(&self, path: &str) -> Result<Stat> {
        let ino = tree_lookup(&self.device, path).ok_or(Error::NoEntry)?;
        let node = inode_table::get(&self.device, ino);
        Ok(Stat {
            ino: ino.value(),
            mode: node.mode,
            size: node.size,
            nlink: node.refs,
            // SAFETY: `getuid` takes no arguments and cannot fail.
            uid: unsafe { libc::getuid() },
        })
    }

    /// Reads up to `buf.len()` bytes from `path` starting at `offset`,
    /// returning the number of bytes actually read.
    pub fn read(&self, path: &str, buf: &mut [u8], offset: usize) -> Result<usize> {
        let ino = tree_lookup(&self.device, path).ok_or(Error::NoEntry)?;
        let node = inode_table::get(&self.device, ino);
        if node.is_directory() {
            return Err(Error::IsDirectory);
        }
        if !node.owner_can_read() {
            return Err(Error::Denied);
        }
        let size = node.size as usize;
        if offset > size {
            return Err(Error::BadSeek);
        }
        let block_index = node.block_no().as_index().unwrap_or(0);
        let to_read = buf.len().min(size - offset);
        let block = self.device.block(block_index);
        buf[..to_read].copy_from_slice(&block[offset..offset + to_read]);
        Ok(to_read)
    }

    /// Writes `data` into `path` at `offset`, growing the file but never
    /// shrinking it. Returns the number of bytes written.
    pub fn write(&mut self, path: &str, data: &[u8], offset: usize) -> Result<usize> {
        let ino = tree_lookup(&self.device, path).ok_or(Error::NoEntry)?;
        if offset + data.len() > BLOCK_SIZE {
            return Err(Error::FileTooBig);
        }
        let node = inode_table::get(&self.device, ino);
        if node.is_directory() {
            return Err(Error::IsDirectory);
        }
        if !node.owner_can_write() {
            return Err(Error::Denied);
        }
        let block_index = node.block_no().as_index().expect("allocated inode without a data block");

        let block = self.device.block_mut(block_index);
        block[offset..offset + data.len()].copy_from_slice(data);

        let new_size = node.size.max(u32::try_from(offset + data.len()).unwrap());
        inode_table::grow(&mut self.device, ino, new_size);

        Ok(data.len())
    }

    /// Resizes `path` to `size` bytes, zero-filling newly exposed bytes
    /// when growing.
    pub fn truncate(&mut self, path: &str, size: i64) -> Result<()> {
        if size < 0 {
            return Err(Error::Invalid);
        }
        if size as usize > BLOCK_SIZE {
            return Err(Error::FileTooBig);
        }
        let ino = tree_lookup(&self.device, path).ok_or(Error::NoEntry)?;
        let node = inode_table::get(&self.device, ino);
        if node.is_directory() {
            return Err(Error::IsDirectory);
        }
        if !node.owner_can_write() {
            return Err(Error::Denied);
        }

        let old_size = node.size as usize;
        let new_size = size as usize;
        let block_index = node.block_no().as_index().expect("allocated inode without a data block");

        if new_size > old_size {
            self.device.block_mut(block_index)[old_size..new_size].fill(0);
            inode_table::grow(&mut self.device, ino, u32::try_from(new_size).unwrap());
        } else {
            inode_table::shrink(&mut self.device, ino, u32::try_from(new_size).unwrap());
        }
        Ok(())
    }

    /// Creates a new file or directory at `path` with the given `mode`.
    pub fn mknod(&mut self, path: &str, mode: u32) -> Result<()> {
        if tree_lookup(&self.device, path).is_some() {
            return Err(Error::Exists);
        }

        let parent_path = parent_of(path);
        let child_name = basename_of(path);
        if child_name.len() >= DIR_NAME_LENGTH {
            return Err(Error::Invalid);
        }

        let parent = tree_lookup(&self.device, parent_path).ok_or(Error::NoEntry)?;
        let parent_node = inode_table::get(&self.device, parent);
        if !parent_node.is_directory() {
            return Err(Error::NotDirectory);
        }
        if !parent_node.owner_can_write() {
            return Err(Error::Denied);
        }
        if parent_node.size as usize + DIR_ENTRY_SIZE > BLOCK_SIZE {
            return Err(Error::NoSpace);
        }

        let child = inode_table::alloc(&mut self.device).ok_or(Error::NoSpace)?;
        let node = inode_table::get_mut(&mut self.device, child);
        node.mode = mode;
        node.size = 0;

        directory_put(&mut self.device, parent, child_name, child)?;

        if onefs_types::MODE_TYPE_DIR == mode / 0o10_000 {
            directory_put(&mut self.device, child, ".", child)?;
            directory_put(&mut self.device, child, "..", parent)?;
        }

        Ok(())
    }

    /// Removes the directory entry for `path`, decrementing the target
    /// inode's reference count (and freeing it if that count reaches zero).
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let parent = tree_lookup(&self.device, parent_of(path)).ok_or(Error::NoEntry)?;
        let parent_node = inode_table::get(&self.device, parent);
        if !parent_node.is_directory() {
            return Err(Error::NotDirectory);
        }
        if !parent_node.owner_can_write() {
            return Err(Error::Denied);
        }
        directory_delete(&mut self.device, parent, basename_of(path))
    }

    /// Creates a new hard link `to` pointing at the inode named by `from`.
    ///
    /// Directories may not be linked this way (only `mknod`'s internal
    /// `.`/`..` insertion is allowed to reference a directory a second
    /// time); this avoids creating a cycle in the directory tree.
    pub fn link(&mut self, from: &str, to: &str) -> Result<()> {
        let from_ino = tree_lookup(&self.device, from).ok_or(Error::NoEntry)?;
        if inode_table::get(&self.device, from_ino).is_directory() {
            return Err(Error::PermDenied);
        }
        if tree_lookup(&self.device, to).is_some() {
            return Err(Error::Exists);
        }

        let to_parent = tree_lookup(&self.device, parent_of(to)).ok_or(Error::NoEntry)?;
        let parent_node = inode_table::get(&self.device, to_parent);
        if !parent_node.is_directory() {
            return Err(Error::NotDirectory);
        }
        if !parent_node.owner_can_write() {
            return Err(Error::Denied);
        }

        directory_put(&mut self.device, to_parent, basename_of(to), from_ino)
    }

    /// Renames `from` to `to`: equivalent to `link` followed by `unlink`.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.link(from, to)?;
        self.unlink(from)
    }

    /// Removes the empty directory at `path`.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        if path == "/" {
            return Err(Error::PermDenied);
        }

        let ino = tree_lookup(&self.device, path).ok_or(Error::NoEntry)?;
        let node = inode_table::get(&self.device, ino);
        if !node.is_directory() {
            return Err(Error::NotDirectory);
        }
        if node.size as usize > 2 * onefs_types::DIR_ENTRY_SIZE {
            return Err(Error::NotEmpty);
        }
        if !node.owner_can_write() {
            return Err(Error::Denied);
        }

        directory_delete(&mut self.device, ino, ".")?;
        directory_delete(&mut self.device, ino, "..")?;

        let parent = tree_lookup(&self.device, parent_of(path)).ok_or(Error::NoEntry)?;
        directory_delete(&mut self.device, parent, basename_of(path))
    }

    /// Lists the names of every entry in the directory at `path`, or
    /// `None` if `path` does not name a directory.
    #[must_use]
    pub fn list(&self, path: &str) -> Option<Vec<String>> {
        let ino = tree_lookup(&self.device, path)?;
        directory_list(&self.device, ino)
    }

    /// Always unsupported; present so the interface is complete.
    pub fn set_time(&mut self, _path: &str, _seconds: i64) -> Result<()> {
        Err(Error::Unsupported)
    }
}
