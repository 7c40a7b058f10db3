use alloc::sync::Arc;

use crate::geometry;
use crate::layout::DiskInode;
use crate::{BlockDevice, Error, MAX_INODES, Result};

/// 紧跟超级块的 inode 表，每块8个 inode
pub struct InodeTable {
    device: Arc<dyn BlockDevice>,
}

impl InodeTable {
    #[inline]
    pub fn new(device: Arc<dyn BlockDevice>) -> Self {
        Self { device }
    }

    pub fn read(&self, index: u32) -> Result<DiskInode> {
        Self::load(&*self.device, index)
    }

    pub fn write(&self, index: u32, inode: &DiskInode) -> Result<()> {
        Self::store(&*self.device, index, inode)
    }

    pub fn load(device: &dyn BlockDevice, index: u32) -> Result<DiskInode> {
        Self::check(index)?;
        let mut bytes = [0u8; DiskInode::SIZE];
        device.read_at(geometry::inode_offset(index), &mut bytes)?;
        Ok(DiskInode::decode(&bytes))
    }

    pub fn store(device: &dyn BlockDevice, index: u32, inode: &DiskInode) -> Result<()> {
        Self::check(index)?;
        let mut bytes = [0u8; DiskInode::SIZE];
        inode.encode(&mut bytes);
        device.write_at(geometry::inode_offset(index), &bytes)?;
        Ok(())
    }

    #[inline]
    fn check(index: u32) -> Result<()> {
        if (index as usize) < MAX_INODES {
            Ok(())
        } else {
            Err(Error::InvalidIndex)
        }
    }
}
