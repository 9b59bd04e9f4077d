//! Resolves slash-separated absolute paths to inode numbers.
//!
//! There is no symlink resolution and no special handling of `.`/`..`
//! beyond whatever literal directory entries a directory happens to
//! contain (every directory does contain both, by construction).

use onefs_types::InodeNo;

use crate::{block_device::BlockDevice, directory::directory_lookup};

/// Resolves `path` starting from the root inode.
///
/// `""` and `"/"` both resolve to the root. Any missing path component, or
/// any non-final component that is not a directory, yields `None`.
#[must_use]
pub fn tree_lookup(device: &BlockDevice, path: &str) -> Option<InodeNo> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut current = InodeNo::ROOT;
    if path.is_empty() {
        return Some(current);
    }
    for component in path.split('/') {
        current = directory_lookup(device, current, component)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use onefs_types::ROOT_MODE;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{directory::directory_put, inode_table};

    fn mounted_root() -> BlockDevice {
        let file = NamedTempFile::new().unwrap();
        let mut device = BlockDevice::open(file.path()).unwrap();
        device.mark_block_allocated(onefs_params::BITMAP_BLOCK);
        let root = inode_table::alloc(&mut device).unwrap();
        assert_eq!(root, InodeNo::ROOT);
        let node = inode_table::get_mut(&mut device, root);
        node.refs = 1;
        node.mode = ROOT_MODE;
        directory_put(&mut device, root, ".", root).unwrap();
        directory_put(&mut device, root, "..", root).unwrap();
        device
    }

    #[test]
    fn root_resolves_from_empty_and_slash() {
        let device = mounted_root();
        assert_eq!(tree_lookup(&device, ""), Some(InodeNo::ROOT));
        assert_eq!(tree_lookup(&device, "/"), Some(InodeNo::ROOT));
    }

    #[test]
    fn nested_path_walks_each_component() {
        let mut device = mounted_root();
        let dir = inode_table::alloc(&mut device).unwrap();
        inode_table::get_mut(&mut device, dir).mode = ROOT_MODE;
        directory_put(&mut device, dir, ".", dir).unwrap();
        directory_put(&mut device, dir, "..", InodeNo::ROOT).unwrap();
        directory_put(&mut device, InodeNo::ROOT, "sub", dir).unwrap();

        let file = inode_table::alloc(&mut device).unwrap();
        directory_put(&mut device, dir, "leaf", file).unwrap();

        assert_eq!(tree_lookup(&device, "/sub"), Some(dir));
        assert_eq!(tree_lookup(&device, "/sub/leaf"), Some(file));
    }

    #[test]
    fn missing_component_is_none() {
        let device = mounted_root();
        assert_eq!(tree_lookup(&device, "/nope"), None);
    }

    #[test]
    fn walking_through_a_file_is_none() {
        let mut device = mounted_root();
        let file = inode_table::alloc(&mut device).unwrap();
        directory_put(&mut device, InodeNo::ROOT, "f", file).unwrap();
        assert_eq!(tree_lookup(&device, "/f/anything"), None);
    }
}
