//! End-to-end behavioral tests driving [`onefs::Storage`] through its
//! public operations against a temporary backing file, mirroring the
//! boundary scenarios the on-disk format is expected to satisfy.

use onefs::error::Error;
use onefs_params::BLOCK_SIZE;
use tempfile::NamedTempFile;

fn mounted() -> onefs::Storage {
    let file = NamedTempFile::new().unwrap();
    onefs::Storage::mount(file.path()).unwrap()
}

#[test]
fn fresh_image_has_a_root_directory_with_dot_and_dotdot() {
    let storage = mounted();

    let stat = storage.stat("/").unwrap();
    assert_eq!(stat.mode, 0o040_755);
    assert_eq!(stat.size as usize, 2 * onefs_types::DIR_ENTRY_SIZE);
    assert!(stat.nlink >= 1);

    assert_eq!(storage.list("/").unwrap(), vec![".", ".."]);
}

#[test]
fn write_then_read_round_trips_and_reports_bad_seek_past_end() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();

    assert_eq!(storage.write("/a", b"hello", 0).unwrap(), 5);

    let mut buf = [0u8; 10];
    assert_eq!(storage.read("/a", &mut buf, 0).unwrap(), 5);
    assert_eq!(&buf[..5], b"hello");

    assert_eq!(storage.read("/a", &mut buf, 5).unwrap(), 0);
    assert_eq!(storage.read("/a", &mut buf[..1], 6).unwrap_err(), Error::BadSeek);
}

#[test]
fn write_past_one_block_is_file_too_big() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();

    let zeros = vec![0u8; BLOCK_SIZE + 1];
    assert_eq!(storage.write("/a", &zeros, 0).unwrap_err(), Error::FileTooBig);

    let full = vec![7u8; BLOCK_SIZE];
    assert_eq!(storage.write("/a", &full, 0).unwrap(), BLOCK_SIZE);
    assert_eq!(storage.stat("/a").unwrap().size as usize, BLOCK_SIZE);

    assert_eq!(storage.write("/a", &[1], BLOCK_SIZE).unwrap_err(), Error::FileTooBig);
}

#[test]
fn rmdir_rejects_nonempty_then_succeeds_once_emptied() {
    let mut storage = mounted();
    storage.mknod("/d", 0o040_755).unwrap();
    storage.mknod("/d/f", 0o100_644).unwrap();

    assert_eq!(storage.rmdir("/d").unwrap_err(), Error::NotEmpty);

    storage.unlink("/d/f").unwrap();
    storage.rmdir("/d").unwrap();

    assert_eq!(storage.stat("/d").unwrap_err(), Error::NoEntry);
}

#[test]
fn unlinking_a_hard_link_frees_the_inode_only_once_both_names_are_gone() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();
    let ino_before = storage.stat("/a").unwrap().ino;

    storage.link("/a", "/b").unwrap();
    assert_eq!(storage.stat("/a").unwrap().nlink, 2);

    storage.unlink("/a").unwrap();
    let mut buf = [0u8; 4];
    assert!(storage.read("/b", &mut buf, 0).is_ok());

    storage.unlink("/b").unwrap();
    assert_eq!(storage.stat("/b").unwrap_err(), Error::NoEntry);

    // The freed inode slot is available for reuse by the next allocation.
    storage.mknod("/c", 0o100_644).unwrap();
    assert_eq!(storage.stat("/c").unwrap().ino, ino_before);
}

#[test]
fn rmdir_of_root_is_permission_denied() {
    let mut storage = mounted();
    assert_eq!(storage.rmdir("/").unwrap_err(), Error::PermDenied);
}

#[test]
fn mknod_then_stat_reports_the_requested_mode_and_a_fresh_inode() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();

    let stat = storage.stat("/a").unwrap();
    assert_eq!(stat.mode, 0o100_644);
    assert_eq!(stat.size, 0);
    assert_eq!(stat.nlink, 1);
}

#[test]
fn mknod_of_an_existing_path_is_exists() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();
    assert_eq!(storage.mknod("/a", 0o100_644).unwrap_err(), Error::Exists);
}

#[test]
fn rename_moves_an_entry_between_directories() {
    let mut storage = mounted();
    storage.mknod("/d1", 0o040_755).unwrap();
    storage.mknod("/d2", 0o040_755).unwrap();
    storage.mknod("/d1/a", 0o100_644).unwrap();
    storage.write("/d1/a", b"payload", 0).unwrap();

    storage.rename("/d1/a", "/d2/a").unwrap();

    assert_eq!(storage.stat("/d1/a").unwrap_err(), Error::NoEntry);
    let mut buf = [0u8; 16];
    let n = storage.read("/d2/a", &mut buf, 0).unwrap();
    assert_eq!(&buf[..n], b"payload");
}

#[test]
fn directory_tree_construction_and_nested_lookup() {
    let mut storage = mounted();
    storage.mknod("/a", 0o040_755).unwrap();
    storage.mknod("/a/b", 0o040_755).unwrap();
    storage.mknod("/a/b/c", 0o100_644).unwrap();

    assert_eq!(storage.list("/a").unwrap(), vec![".", "..", "b"]);
    assert_eq!(storage.list("/a/b").unwrap(), vec![".", "..", "c"]);
    assert!(storage.stat("/a/b/c").is_ok());
}

#[test]
fn reading_without_owner_read_permission_is_denied() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_200).unwrap(); // write-only
    let mut buf = [0u8; 1];
    assert_eq!(storage.read("/a", &mut buf, 0).unwrap_err(), Error::Denied);
}

#[test]
fn writing_without_owner_write_permission_is_denied() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_444).unwrap(); // read-only
    assert_eq!(storage.write("/a", b"x", 0).unwrap_err(), Error::Denied);
}

#[test]
fn reading_or_writing_a_directory_is_is_directory() {
    let mut storage = mounted();
    storage.mknod("/d", 0o040_755).unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(storage.read("/d", &mut buf, 0).unwrap_err(), Error::IsDirectory);
    assert_eq!(storage.write("/d", b"x", 0).unwrap_err(), Error::IsDirectory);
}

#[test]
fn linking_a_directory_is_rejected() {
    let mut storage = mounted();
    storage.mknod("/d", 0o040_755).unwrap();
    assert_eq!(storage.link("/d", "/d2").unwrap_err(), Error::PermDenied);
}

#[test]
fn set_time_is_unsupported() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();
    assert_eq!(storage.set_time("/a", 0).unwrap_err(), Error::Unsupported);
}

#[test]
fn truncate_shrinks_and_grows_zero_filling_newly_exposed_bytes() {
    let mut storage = mounted();
    storage.mknod("/a", 0o100_644).unwrap();
    storage.write("/a", b"hello world", 0).unwrap();

    storage.truncate("/a", 5).unwrap();
    assert_eq!(storage.stat("/a").unwrap().size, 5);

    storage.truncate("/a", 8).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(storage.read("/a", &mut buf, 0).unwrap(), 8);
    assert_eq!(&buf[..5], b"hello");
    assert_eq!(&buf[5..8], &[0, 0, 0]);
}

#[test]
fn remounting_preserves_writes_after_flush() {
    let file = NamedTempFile::new().unwrap();
    {
        let mut storage = onefs::Storage::mount(file.path()).unwrap();
        storage.mknod("/a", 0o100_644).unwrap();
        storage.write("/a", b"persisted", 0).unwrap();
        storage.flush().unwrap();
    }

    let storage = onefs::Storage::mount(file.path()).unwrap();
    let mut buf = [0u8; 16];
    let n = storage.read("/a", &mut buf, 0).unwrap();
    assert_eq!(&buf[..n], b"persisted");
}
