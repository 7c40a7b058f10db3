//! 直接索引的磁盘 inode
//!
//! 目录的空间用于存放子项的目录项；
//! 文件的空间用于存放它的数据。

use enumflags2::{BitFlags, bitflags};

use super::{get_u16, get_u32, put_u16, put_u32};
use crate::{BLOCK_SIZE, DIRECT_BLOCKS, ROOT_GID, ROOT_UID};

/// 类型标签所占的位
const TYPE_MASK: u16 = 0o170000;
const TYPE_DIR: u16 = 0o040000;
const TYPE_FILE: u16 = 0o100000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// |文件类型|user rwx|group rwx|other rwx|
    pub mode: u16,
    /// 硬链接个数
    pub links: u16,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
    pub uid: u16,
    pub gid: u16,
    // 16位，限制了文件大小
    pub size: u16,
    /// 已分配的直接索引块数
    pub blocks: u16,
    /// 直接索引块，存放的是数据区内的块索引，仅前`blocks`个有效
    pub direct: [u32; DIRECT_BLOCKS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    File,
    Directory,
}

#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    OtherExec = 0o001,
    OtherWrite = 0o002,
    OtherRead = 0o004,
    GroupExec = 0o010,
    GroupWrite = 0o020,
    GroupRead = 0o040,
    UserExec = 0o100,
    UserWrite = 0o200,
    UserRead = 0o400,
}

impl Permission {
    /// rwxr-xr-x
    pub fn dir_default() -> BitFlags<Self> {
        Self::UserRead
            | Self::UserWrite
            | Self::UserExec
            | Self::GroupRead
            | Self::GroupExec
            | Self::OtherRead
            | Self::OtherExec
    }
}

impl DiskInode {
    /// 记录在磁盘上的字节数，末尾4字节为填充
    pub const SIZE: usize = 64;

    /// 未分配任何块、没有任何链接的新 inode
    pub fn new(kind: InodeKind, perm: BitFlags<Permission>, now: u32) -> Self {
        let tag = match kind {
            InodeKind::File => TYPE_FILE,
            InodeKind::Directory => TYPE_DIR,
        };
        Self {
            mode: tag | perm.bits(),
            atime: now,
            mtime: now,
            ctime: now,
            uid: ROOT_UID,
            gid: ROOT_GID,
            ..Default::default()
        }
    }

    /// 类型标签无法识别时为空
    #[inline]
    pub fn kind(&self) -> Option<InodeKind> {
        match self.mode & TYPE_MASK {
            TYPE_FILE => Some(InodeKind::File),
            TYPE_DIR => Some(InodeKind::Directory),
            _ => None,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind() == Some(InodeKind::Directory)
    }

    #[inline]
    pub fn permissions(&self) -> BitFlags<Permission> {
        BitFlags::from_bits_truncate(self.mode)
    }

    /// 当前有效的直接索引
    #[inline]
    pub fn direct_blocks(&self) -> &[u32] {
        &self.direct[..(self.blocks as usize).min(DIRECT_BLOCKS)]
    }

    #[inline]
    pub fn touch(&mut self, now: u32) {
        self.mtime = now;
        self.ctime = now;
    }

    /// 计算容纳指定数据量需要多少个**数据块**
    #[inline]
    pub fn count_data_block(size: usize) -> usize {
        size.div_ceil(BLOCK_SIZE)
    }

    pub fn decode(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= Self::SIZE);
        let mut direct = [0; DIRECT_BLOCKS];
        for (i, block) in direct.iter_mut().enumerate() {
            *block = get_u32(bytes, 24 + i * 4);
        }
        Self {
            mode: get_u16(bytes, 0),
            links: get_u16(bytes, 2),
            atime: get_u32(bytes, 4),
            mtime: get_u32(bytes, 8),
            ctime: get_u32(bytes, 12),
            uid: get_u16(bytes, 16),
            gid: get_u16(bytes, 18),
            size: get_u16(bytes, 20),
            blocks: get_u16(bytes, 22),
            direct,
        }
    }

    pub fn encode(&self, bytes: &mut [u8]) {
        assert!(bytes.len() >= Self::SIZE);
        put_u16(bytes, 0, self.mode);
        put_u16(bytes, 2, self.links);
        put_u32(bytes, 4, self.atime);
        put_u32(bytes, 8, self.mtime);
        put_u32(bytes, 12, self.ctime);
        put_u16(bytes, 16, self.uid);
        put_u16(bytes, 18, self.gid);
        put_u16(bytes, 20, self.size);
        put_u16(bytes, 22, self.blocks);
        for (i, &block) in self.direct.iter().enumerate() {
            put_u32(bytes, 24 + i * 4, block);
        }
        bytes[60..Self::SIZE].fill(0);
    }
}
