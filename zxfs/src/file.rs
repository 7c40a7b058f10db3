//! # 文件映射
//!
//! 把字节偏移映射到直接索引块上。
//! 每次写入或截断之后都有 `blocks == ceil(size / 512)`，
//! 块中超出`size`的部分恒为0。

use alloc::vec;
use alloc::vec::Vec;

use crate::data;
use crate::layout::DiskInode;
use crate::{
    BLOCK_SIZE, BlockDevice, DIRECT_BLOCKS, Error, MAX_FILE_SIZE, Result, SuperBlockManager,
};

pub struct FileMapping<'a> {
    device: &'a dyn BlockDevice,
    sb: &'a SuperBlockManager,
}

impl<'a> FileMapping<'a> {
    #[inline]
    pub fn new(device: &'a dyn BlockDevice, sb: &'a SuperBlockManager) -> Self {
        Self { device, sb }
    }

    /// 读出`[offset, offset + len)`，超出文件末尾的部分被截掉
    pub fn read(&self, inode: &DiskInode, offset: usize, len: usize) -> Result<Vec<u8>> {
        let len = len.min((inode.size as usize).saturating_sub(offset));
        let mut buf = vec![0; len];
        let read = self.read_into(inode, offset, &mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// 返回实际读到的字节数
    pub fn read_into(&self, inode: &DiskInode, offset: usize, buf: &mut [u8]) -> Result<usize> {
        self.verify(inode)?;
        let size = inode.size as usize;
        if offset >= size {
            return Ok(0);
        }
        let end = size.min(offset + buf.len());

        let mut block = [0u8; BLOCK_SIZE];
        let mut start = offset;
        let mut read = 0;
        while start < end {
            let window = start / BLOCK_SIZE;
            let block_end = ((window + 1) * BLOCK_SIZE).min(end);
            let id = *inode
                .direct_blocks()
                .get(window)
                .ok_or(Error::SparseAccess)?;
            data::read_block(self.device, id, &mut block)?;

            let inner = start % BLOCK_SIZE;
            let count = block_end - start;
            buf[read..read + count].copy_from_slice(&block[inner..inner + count]);
            read += count;
            start = block_end;
        }
        Ok(read)
    }

    /// 写入`bytes`，必要时为`[blocks, 末块]`分配全零块
    pub fn write(
        &self,
        inode: &mut DiskInode,
        offset: usize,
        bytes: &[u8],
        now: u32,
    ) -> Result<usize> {
        let end = offset.checked_add(bytes.len()).ok_or(Error::FileTooLarge)?;
        if end > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }
        if bytes.is_empty() {
            return Ok(0);
        }

        self.verify(inode)?;
        self.append_blocks(inode, DiskInode::count_data_block(end))?;
        if end > inode.size as usize {
            inode.size = end as u16;
        }

        let mut block = [0u8; BLOCK_SIZE];
        let mut start = offset;
        let mut written = 0;
        while start < end {
            let window = start / BLOCK_SIZE;
            let block_end = ((window + 1) * BLOCK_SIZE).min(end);
            let id = inode.direct[window];
            let inner = start % BLOCK_SIZE;
            let count = block_end - start;
            // 整块覆盖时不必先读
            if count < BLOCK_SIZE {
                data::read_block(self.device, id, &mut block)?;
            }
            block[inner..inner + count].copy_from_slice(&bytes[written..written + count]);
            data::write_block(self.device, id, &block)?;
            written += count;
            start = block_end;
        }

        inode.touch(now);
        Ok(written)
    }

    pub fn truncate(&self, inode: &mut DiskInode, new_size: usize, now: u32) -> Result<()> {
        if new_size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }
        self.verify(inode)?;
        let keep = DiskInode::count_data_block(new_size);

        if new_size < inode.size as usize {
            let tail = new_size % BLOCK_SIZE;
            if tail != 0 {
                let id = inode.direct[keep - 1];
                let mut block = [0u8; BLOCK_SIZE];
                data::read_block(self.device, id, &mut block)?;
                block[tail..].fill(0);
                data::write_block(self.device, id, &block)?;
            }
            self.free_tail(inode, keep)?;
        } else {
            self.append_blocks(inode, keep)?;
        }

        inode.size = new_size as u16;
        inode.touch(now);
        Ok(())
    }

    /// 扩充到`target`个块，新块全部清零。
    ///
    /// 中途失败时，本次已分配的块会被归还。
    pub fn grow_to(&self, inode: &mut DiskInode, target: usize) -> Result<()> {
        self.verify(inode)?;
        self.append_blocks(inode, target)
    }

    #[inline]
    pub fn release_all(&self, inode: &mut DiskInode) -> Result<()> {
        self.verify(inode)?;
        self.free_tail(inode, 0)?;
        inode.size = 0;
        Ok(())
    }

    /// 块数必须与`size`相符，且不超过直接索引个数。
    ///
    /// 不符的记录只可能来自损坏的镜像，镜像随即被标记为错误。
    fn verify(&self, inode: &DiskInode) -> Result<()> {
        let blocks = inode.blocks as usize;
        if blocks <= DIRECT_BLOCKS && blocks == DiskInode::count_data_block(inode.size as usize) {
            return Ok(());
        }
        log::error!(
            "inode record is corrupt: {} blocks for {} bytes",
            inode.blocks,
            inode.size
        );
        self.sb.mark_error()?;
        Err(Error::CorruptSuperblock)
    }

    fn append_blocks(&self, inode: &mut DiskInode, target: usize) -> Result<()> {
        if target > DIRECT_BLOCKS {
            return Err(Error::FileTooLarge);
        }
        let start = inode.blocks as usize;
        for window in start..target {
            match self.fresh_block() {
                Ok(id) => {
                    inode.direct[window] = id;
                    inode.blocks = window as u16 + 1;
                }
                Err(err) => {
                    self.free_tail(inode, start)?;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// 从末尾开始释放，直到只剩`keep`个块
    fn free_tail(&self, inode: &mut DiskInode, keep: usize) -> Result<()> {
        while inode.blocks as usize > keep {
            let window = inode.blocks as usize - 1;
            self.sb.free_block(inode.direct[window])?;
            inode.direct[window] = 0;
            inode.blocks -= 1;
        }
        Ok(())
    }

    fn fresh_block(&self) -> Result<u32> {
        let id = self.sb.allocate_block()?;
        if let Err(err) = data::zeroize(self.device, id) {
            self.sb.free_block(id)?;
            return Err(err);
        }
        Ok(id)
    }
}
