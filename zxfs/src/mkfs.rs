//! # 格式化
//!
//! 依次写出：清零的超级块所在块、清零的 inode 表、根 inode、根目录数据块，
//! 最后才写超级块记录，中途失败的镜像不会带有合法的超级块。

use crate::data;
use crate::geometry::{self, INODE_TABLE_BLOCKS, INODE_TABLE_START, MIN_DEVICE_BLOCKS};
use crate::layout::{DirEntry, DiskInode, InodeKind, Permission, SuperBlock};
use crate::{
    BLOCK_SIZE, BlockDevice, Error, InodeTable, ROOT_INODE, Result, SuperBlockManager,
};

pub fn format(device: &dyn BlockDevice, total_blocks: u32, now: u32) -> Result<()> {
    if total_blocks < MIN_DEVICE_BLOCKS {
        return Err(Error::DeviceTooSmall);
    }

    if SuperBlockManager::read(device).is_ok_and(|old| old.has_magic()) {
        log::warn!("overwriting an existing zxfs image");
    }

    let zero = [0u8; BLOCK_SIZE];
    device.write_at(geometry::super_block_offset(), &zero)?;
    for block in INODE_TABLE_START..INODE_TABLE_START + INODE_TABLE_BLOCKS {
        device.write_at(geometry::block_offset(block), &zero)?;
    }

    let mut sb = SuperBlock::empty();
    let ino = sb.take_inode()?;
    let block = sb.take_block()?;
    debug_assert_eq!(ino, ROOT_INODE);
    debug_assert_eq!(block, 0);

    let mut root = DiskInode::new(InodeKind::Directory, Permission::dir_default(), now);
    root.links = 2;
    root.size = BLOCK_SIZE as u16;
    root.blocks = 1;
    root.direct[0] = block;
    InodeTable::store(device, ino, &root)?;

    let mut dir_block = DirEntry::unused_block();
    DirEntry::new(b".", ino).encode(&mut dir_block[..DirEntry::SIZE]);
    DirEntry::new(b"..", ino).encode(&mut dir_block[DirEntry::SIZE..]);
    data::write_block(device, block, &dir_block)?;

    SuperBlockManager::persist(device, &sb)?;
    device.flush()?;

    log::info!("formatted zxfs image of {total_blocks} blocks");
    Ok(())
}
