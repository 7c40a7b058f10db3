//! # zxfs (zero x file system)
//!
//! 仅有直接索引的极简 inode 文件系统：64 个 inode，576 个数据块，块大小 512 字节。
//!
//! 磁盘布局（以块为单位）：
//! 跳过区 | 超级块 | inode 表 | 数据区
//!
//! 超级块里同时存放空闲计数与 inode / 数据块两张位图。

#![no_std]

extern crate alloc;

/* zxfs 的整体架构，自上而下 */

// 挂载层：对外暴露 format / mount / lookup / create 等操作
mod fs;
mod node;

// 目录引擎与文件映射
mod dir;
mod file;

// 格式化与诊断
mod mkfs;
pub mod inspect;

// 元数据管理：超级块、位图分配器、inode 表
mod allocator;
mod inode_table;
mod superblock;

// 磁盘数据结构层
mod layout;

mod clock;
mod data;
mod error;
pub mod geometry;

pub use block_dev::{BlockDevice, IoError};

pub use self::{
    clock::{Clock, NoClock},
    error::{Error, Result},
    fs::{Stat, ZxFileSystem},
    inode_table::InodeTable,
    layout::{
        Bitmap, BlockBitmap, DirEntry, DiskInode, FsState, InodeBitmap, InodeKind, Permission,
        SuperBlock,
    },
    mkfs::format,
    node::{DirNode, FileNode, Node},
    superblock::SuperBlockManager,
};

pub const MAGIC: u32 = 0x2E40_F500;
pub const BLOCK_SIZE: usize = 512;

pub const MAX_INODES: usize = 64;
pub const MAX_BLOCKS: usize = 576;
/// 每个 inode 的直接索引个数
pub const DIRECT_BLOCKS: usize = 9;
/// 普通文件的硬链接上限
pub const MAX_LINKS: u16 = 3;
pub const MAX_NAME_LEN: usize = 31;
/// 文件大小上限：受直接索引个数与 16 位`size`字段两者约束，取小者
pub const MAX_FILE_SIZE: usize = {
    let by_blocks = DIRECT_BLOCKS * BLOCK_SIZE;
    if by_blocks < u16::MAX as usize {
        by_blocks
    } else {
        u16::MAX as usize
    }
};

pub const ROOT_INODE: u32 = 0;
pub const ROOT_UID: u16 = 0;
pub const ROOT_GID: u16 = 0;

pub type DataBlock = [u8; BLOCK_SIZE];
