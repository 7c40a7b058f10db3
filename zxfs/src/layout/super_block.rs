use derive_more::Display;

use super::bitmap::{BLOCK_BITMAP_WORDS, Bitmap, BlockBitmap, InodeBitmap};
use super::{get_u32, get_u64, put_u32, put_u64};
use crate::{Error, MAGIC, Result};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录空闲计数与两张分配位图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    pub magic: u32,
    pub state: FsState,
    pub free_inodes: u32,
    pub inode_bitmap: InodeBitmap,
    pub free_blocks: u32,
    pub block_bitmap: BlockBitmap,
}

/// 一旦检测到损坏就置为`Error`，不会自动恢复
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FsState {
    #[display(fmt = "valid")]
    Valid = 0,
    #[display(fmt = "error")]
    Error = 1,
}

impl SuperBlock {
    /// 记录在磁盘上的字节数
    pub const SIZE: usize = 24 + BLOCK_BITMAP_WORDS * 4;

    /// 全部空闲的超级块
    pub fn empty() -> Self {
        Self {
            magic: MAGIC,
            state: FsState::Valid,
            free_inodes: InodeBitmap::CAPACITY as u32,
            inode_bitmap: InodeBitmap::default(),
            free_blocks: BlockBitmap::CAPACITY as u32,
            block_bitmap: BlockBitmap::default(),
        }
    }

    #[inline]
    pub fn has_magic(&self) -> bool {
        self.magic == MAGIC
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.has_magic() && self.state == FsState::Valid
    }

    /// 空闲计数与位图中的0位个数一致
    pub fn is_consistent(&self) -> bool {
        self.free_inodes as usize == self.inode_bitmap.count_zeros()
            && self.free_blocks as usize == self.block_bitmap.count_zeros()
    }

    pub fn decode(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= Self::SIZE);
        let mut words = [0; BLOCK_BITMAP_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = get_u32(bytes, 24 + i * 4);
        }
        Self {
            magic: get_u32(bytes, 0),
            state: FsState::from_raw(get_u32(bytes, 4)),
            free_inodes: get_u32(bytes, 8),
            inode_bitmap: InodeBitmap(get_u64(bytes, 12)),
            free_blocks: get_u32(bytes, 20),
            block_bitmap: BlockBitmap(words),
        }
    }

    pub fn encode(&self, bytes: &mut [u8]) {
        assert!(bytes.len() >= Self::SIZE);
        put_u32(bytes, 0, self.magic);
        put_u32(bytes, 4, self.state as u32);
        put_u32(bytes, 8, self.free_inodes);
        put_u64(bytes, 12, self.inode_bitmap.0);
        put_u32(bytes, 20, self.free_blocks);
        for (i, &word) in self.block_bitmap.0.iter().enumerate() {
            put_u32(bytes, 24 + i * 4, word);
        }
    }
}

/* 纯内存上的分配与释放，持久化由 SuperBlockManager 负责 */

impl SuperBlock {
    pub fn take_inode(&mut self) -> Result<u32> {
        self.verify()?;
        let index = self.inode_bitmap.first_clear().ok_or(Error::NoSpace)?;
        Self::mark(&mut self.inode_bitmap, &mut self.free_inodes, index)?;
        Ok(index as u32)
    }

    pub fn release_inode(&mut self, index: u32) -> Result<()> {
        self.verify()?;
        Self::unmark(&mut self.inode_bitmap, &mut self.free_inodes, index as usize)
    }

    pub fn take_block(&mut self) -> Result<u32> {
        self.verify()?;
        let index = self.block_bitmap.first_clear().ok_or(Error::NoSpace)?;
        Self::mark(&mut self.block_bitmap, &mut self.free_blocks, index)?;
        Ok(index as u32)
    }

    pub fn release_block(&mut self, index: u32) -> Result<()> {
        self.verify()?;
        Self::unmark(&mut self.block_bitmap, &mut self.free_blocks, index as usize)
    }

    /// 计数与位图不符即视为损坏
    fn verify(&self) -> Result<()> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(Error::CorruptSuperblock)
        }
    }

    fn mark<B: Bitmap>(bitmap: &mut B, free: &mut u32, index: usize) -> Result<()> {
        // 位是从空闲位里挑出来的，置位失败只可能是位图本身坏了
        if !bitmap.set(index) {
            return Err(Error::CorruptSuperblock);
        }
        *free = free.checked_sub(1).ok_or(Error::CorruptSuperblock)?;
        Ok(())
    }

    fn unmark<B: Bitmap>(bitmap: &mut B, free: &mut u32, index: usize) -> Result<()> {
        if index >= B::CAPACITY {
            return Err(Error::InvalidIndex);
        }
        if !bitmap.clear(index) {
            return Err(Error::DoubleFree);
        }
        *free += 1;
        Ok(())
    }
}

impl FsState {
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Valid,
            _ => Self::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_BLOCKS, MAX_INODES};

    #[test]
    fn codec() {
        let mut sb = SuperBlock::empty();
        assert_eq!(sb.take_inode(), Ok(0));
        assert_eq!(sb.take_block(), Ok(0));
        assert_eq!(sb.take_block(), Ok(1));

        let mut bytes = [0u8; SuperBlock::SIZE];
        sb.encode(&mut bytes);
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..8], &[0; 4]);
        assert_eq!(&bytes[8..12], &63u32.to_le_bytes());
        assert_eq!(&bytes[12..20], &1u64.to_le_bytes());
        assert_eq!(&bytes[20..24], &574u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &0b11u32.to_le_bytes());
        assert_eq!(SuperBlock::decode(&bytes), sb);
    }

    #[test]
    fn counters_follow_bitmaps() {
        let mut sb = SuperBlock::empty();
        for expect in 0..MAX_INODES as u32 {
            assert_eq!(sb.take_inode(), Ok(expect));
            assert!(sb.is_consistent());
        }
        assert_eq!(sb.take_inode(), Err(Error::NoSpace));
        assert_eq!(sb.release_inode(5), Ok(()));
        assert_eq!(sb.free_inodes, 1);
        assert_eq!(sb.release_inode(5), Err(Error::DoubleFree));
        assert_eq!(sb.take_inode(), Ok(5));
    }

    #[test]
    fn out_of_range_free() {
        let mut sb = SuperBlock::empty();
        assert_eq!(sb.release_block(MAX_BLOCKS as u32), Err(Error::InvalidIndex));
        assert_eq!(sb.release_inode(64), Err(Error::InvalidIndex));
    }

    #[test]
    fn mismatch_is_corruption() {
        let mut sb = SuperBlock::empty();
        sb.free_blocks -= 1;
        assert_eq!(sb.take_block(), Err(Error::CorruptSuperblock));
        assert_eq!(sb.take_inode(), Err(Error::CorruptSuperblock));
    }

    #[test]
    fn unknown_state_reads_as_error() {
        let mut bytes = [0u8; SuperBlock::SIZE];
        SuperBlock::empty().encode(&mut bytes);
        bytes[4] = 7;
        assert_eq!(SuperBlock::decode(&bytes).state, FsState::Error);
        assert!(!SuperBlock::decode(&bytes).is_valid());
    }
}
