//! # 几何布局
//!
//! 各区域在设备上的起始块号与字节偏移，全部为编译期常量。

use crate::layout::DiskInode;
use crate::{BLOCK_SIZE, MAX_BLOCKS, MAX_INODES};

/// 设备开头留空的块数
pub const SKIP_BLOCKS: u32 = 4;
pub const SUPER_BLOCK: u32 = SKIP_BLOCKS;
pub const INODE_TABLE_START: u32 = SUPER_BLOCK + 1;
pub const INODE_TABLE_BLOCKS: u32 = (MAX_INODES * DiskInode::SIZE).div_ceil(BLOCK_SIZE) as u32;
pub const DATA_START: u32 = INODE_TABLE_START + INODE_TABLE_BLOCKS;
/// 格式化所需的最少块数
pub const MIN_DEVICE_BLOCKS: u32 = DATA_START + MAX_BLOCKS as u32;

const _: () = assert!(INODE_TABLE_START > SUPER_BLOCK);
const _: () = assert!(DATA_START >= INODE_TABLE_START + INODE_TABLE_BLOCKS);

/// 设备块号 -> 字节偏移
#[inline]
pub const fn block_offset(block: u32) -> u64 {
    block as u64 * BLOCK_SIZE as u64
}

#[inline]
pub const fn super_block_offset() -> u64 {
    block_offset(SUPER_BLOCK)
}

#[inline]
pub const fn inode_offset(index: u32) -> u64 {
    block_offset(INODE_TABLE_START) + index as u64 * DiskInode::SIZE as u64
}

/// 数据区内的块索引 -> 字节偏移
#[inline]
pub const fn data_block_offset(block: u32) -> u64 {
    block_offset(DATA_START + block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions() {
        assert_eq!(SUPER_BLOCK, 4);
        assert_eq!(INODE_TABLE_START, 5);
        assert_eq!(INODE_TABLE_BLOCKS, 8);
        assert_eq!(DATA_START, 13);
        assert_eq!(MIN_DEVICE_BLOCKS, 589);
    }

    #[test]
    fn offsets_are_block_aligned() {
        assert_eq!(super_block_offset() % BLOCK_SIZE as u64, 0);
        assert_eq!(inode_offset(0) % BLOCK_SIZE as u64, 0);
        assert_eq!(inode_offset(8), block_offset(6));
        assert_eq!(data_block_offset(0), 13 * 512);
        assert!(inode_offset(MAX_INODES as u32) <= data_block_offset(0));
    }
}
