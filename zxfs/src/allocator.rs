//! # 位图分配器
//!
//! 总是分配编号最小的空闲项，每次成功的分配或释放都会立即落盘。

use crate::{Result, SuperBlockManager};

impl SuperBlockManager {
    pub fn allocate_inode(&self) -> Result<u32> {
        let index = self.mutate(|sb| sb.take_inode())?;
        log::debug!("allocate inode {index}");
        Ok(index)
    }

    pub fn free_inode(&self, index: u32) -> Result<()> {
        self.mutate(|sb| sb.release_inode(index))?;
        log::debug!("free inode {index}");
        Ok(())
    }

    /// 返回数据区内的块索引
    pub fn allocate_block(&self) -> Result<u32> {
        let block = self.mutate(|sb| sb.take_block())?;
        log::debug!("allocate data block {block}");
        Ok(block)
    }

    pub fn free_block(&self, block: u32) -> Result<()> {
        self.mutate(|sb| sb.release_block(block))?;
        log::debug!("free data block {block}");
        Ok(())
    }
}
