use block_dev::IoError;
use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 魔数不符，或超级块处于错误状态
    #[display(fmt = "superblock is corrupt")]
    CorruptSuperblock,
    /// inode 或数据块位图已满
    #[display(fmt = "no space left on device")]
    NoSpace,
    #[display(fmt = "index out of range")]
    InvalidIndex,
    /// 访问了超出`block_count`的块窗口
    #[display(fmt = "access beyond allocated blocks")]
    SparseAccess,
    #[display(fmt = "name too long")]
    NameTooLong,
    #[display(fmt = "invalid name")]
    InvalidName,
    #[display(fmt = "already exists")]
    AlreadyExists,
    #[display(fmt = "not found")]
    NotFound,
    #[display(fmt = "directory full")]
    DirectoryFull,
    #[display(fmt = "file too large")]
    FileTooLarge,
    #[display(fmt = "device too small")]
    DeviceTooSmall,
    /// 释放了本就空闲的位
    #[display(fmt = "double free")]
    DoubleFree,
    #[display(fmt = "not a directory")]
    NotADirectory,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "directory not empty")]
    DirectoryNotEmpty,
    #[display(fmt = "too many links")]
    TooManyLinks,
    #[display(fmt = "device I/O failed: {:?}", _0)]
    Io(IoError),
}

impl From<IoError> for Error {
    #[inline]
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
