//! Error taxonomy returned by storage operations.

use thiserror::Error;

/// Every reportable failure a storage operation can return.
///
/// Violations of internal invariants (an unallocated inode passed to
/// [`crate::inode_table::InodeTable::get`], a `None` passed where a block
/// index is required) are programming errors and panic instead of
/// appearing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("no such file or directory")]
    NoEntry,
    #[error("file already exists")]
    Exists,
    #[error("not a directory")]
    NotDirectory,
    #[error("is a directory")]
    IsDirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no space left on device")]
    NoSpace,
    #[error("file too large")]
    FileTooBig,
    #[error("invalid seek")]
    BadSeek,
    #[error("permission denied")]
    Denied,
    #[error("operation not permitted")]
    PermDenied,
    #[error("invalid argument")]
    Invalid,
    #[error("operation not supported")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;
