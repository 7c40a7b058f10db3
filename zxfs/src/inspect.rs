//! # 诊断
//!
//! 只读地解码镜像上的任意结构，不做任何校验，损坏的镜像同样可以检查。

use core::fmt;

use crate::data;
use crate::geometry;
use crate::layout::{Bitmap, DirEntry, DiskInode, ENTRIES_PER_BLOCK, SuperBlock};
use crate::{BLOCK_SIZE, BlockDevice, DataBlock, InodeTable, Result, SuperBlockManager};

pub struct Inspector<'a> {
    device: &'a dyn BlockDevice,
}

pub struct SuperBlockReport(pub SuperBlock);

pub struct InodeReport {
    pub index: u32,
    pub inode: DiskInode,
}

pub struct DirBlockReport {
    pub block: u32,
    pub entries: [DirEntry; ENTRIES_PER_BLOCK],
}

/// `device`为真时`block`是设备块号，否则是数据区内的块索引
pub struct RawBlockReport {
    pub block: u32,
    pub device: bool,
    pub bytes: DataBlock,
}

impl<'a> Inspector<'a> {
    #[inline]
    pub fn new(device: &'a dyn BlockDevice) -> Self {
        Self { device }
    }

    pub fn superblock(&self) -> Result<SuperBlockReport> {
        SuperBlockManager::read(self.device).map(SuperBlockReport)
    }

    pub fn inode(&self, index: u32) -> Result<InodeReport> {
        let inode = InodeTable::load(self.device, index)?;
        Ok(InodeReport { index, inode })
    }

    pub fn dir_block(&self, block: u32) -> Result<DirBlockReport> {
        let mut bytes = [0; BLOCK_SIZE];
        data::read_block(self.device, block, &mut bytes)?;
        Ok(DirBlockReport {
            block,
            entries: DirEntry::decode_block(&bytes),
        })
    }

    pub fn raw_block(&self, block: u32) -> Result<RawBlockReport> {
        let mut bytes = [0; BLOCK_SIZE];
        data::read_block(self.device, block, &mut bytes)?;
        Ok(RawBlockReport {
            block,
            device: false,
            bytes,
        })
    }

    /// 任意设备块，包括跳过区、超级块与 inode 表
    pub fn device_block(&self, block: u32) -> Result<RawBlockReport> {
        let mut bytes = [0; BLOCK_SIZE];
        self.device
            .read_at(geometry::block_offset(block), &mut bytes)?;
        Ok(RawBlockReport {
            block,
            device: true,
            bytes,
        })
    }
}

impl fmt::Display for SuperBlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sb = &self.0;
        writeln!(f, "magic:        {:#010x}", sb.magic)?;
        writeln!(f, "state:        {}", sb.state)?;
        writeln!(f, "free inodes:  {}", sb.free_inodes)?;
        writeln!(f, "inode bitmap: {}", sb.inode_bitmap.render())?;
        writeln!(f, "free blocks:  {}", sb.free_blocks)?;
        write!(f, "block bitmap: {}", sb.block_bitmap.render())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inode = &self.inode;
        writeln!(f, "inode {}", self.index)?;
        writeln!(f, "mode:   {:#08o}", inode.mode)?;
        writeln!(f, "links:  {}", inode.links)?;
        writeln!(f, "atime:  {}", inode.atime)?;
        writeln!(f, "mtime:  {}", inode.mtime)?;
        writeln!(f, "ctime:  {}", inode.ctime)?;
        writeln!(f, "uid:    {}", inode.uid)?;
        writeln!(f, "gid:    {}", inode.gid)?;
        writeln!(f, "size:   {}", inode.size)?;
        writeln!(f, "blocks: {}", inode.blocks)?;
        write!(f, "direct:")?;
        for block in inode.direct_blocks() {
            write!(f, " {block}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DirBlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data block {}", self.block)?;
        for (slot, entry) in self.entries.iter().enumerate() {
            match entry.inode() {
                Some(ino) => {
                    let name = core::str::from_utf8(entry.name()).unwrap_or("<invalid utf-8>");
                    write!(f, "\n{slot:>2}: {ino:>2} {name}")?;
                }
                None => write!(f, "\n{slot:>2}: -")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for RawBlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = if self.device { "device" } else { "data" };
        write!(f, "{region} block {}", self.block)?;
        for (row, bytes) in self.bytes.chunks(16).enumerate() {
            write!(f, "\n{:04x}:", row * 16)?;
            for byte in bytes {
                write!(f, " {byte:02x}")?;
            }
        }
        Ok(())
    }
}
