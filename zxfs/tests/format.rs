mod common;

use std::sync::Arc;

use common::{FixedClock, IMAGE_BLOCKS, NOW, RamDisk, formatted};
use zxfs::geometry::{self, MIN_DEVICE_BLOCKS};
use zxfs::{
    Bitmap, DirEntry, DiskInode, Error, FsState, InodeKind, MAGIC, MAX_BLOCKS, MAX_INODES, ROOT_INODE,
    SuperBlockManager, ZxFileSystem,
};

#[test]
fn fresh_image() {
    let (disk, fs) = formatted();

    let sb = fs.super_block().snapshot();
    assert_eq!(sb.magic, MAGIC);
    assert_eq!(sb.state, FsState::Valid);
    assert_eq!(sb.free_inodes as usize, MAX_INODES - 1);
    assert_eq!(sb.free_blocks as usize, MAX_BLOCKS - 1);
    assert!(sb.inode_bitmap.test(0));
    assert!(sb.block_bitmap.test(0));
    assert_eq!(sb.inode_bitmap.count_ones(), 1);
    assert_eq!(sb.block_bitmap.count_ones(), 1);
    assert_eq!(SuperBlockManager::read(&*disk).unwrap(), sb);

    let root = fs.stat(ROOT_INODE).unwrap();
    assert_eq!(root.kind, InodeKind::Directory);
    assert_eq!(root.links, 2);
    assert_eq!(root.size, 512);
    assert_eq!(root.blocks, 1);

    let entries = fs.readdir(ROOT_INODE).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name(), b".");
    assert_eq!(entries[0].inode(), Some(0));
    assert_eq!(entries[1].name(), b"..");
    assert_eq!(entries[1].inode(), Some(0));
}

#[test]
fn root_inode_record() {
    let (_disk, fs) = formatted();
    let root = fs.inode_table().read(ROOT_INODE).unwrap();
    assert_eq!(root.mode, 0o040755);
    assert_eq!(root.direct_blocks(), &[0]);
    assert_eq!((root.uid, root.gid), (0, 0));
    assert_eq!((root.atime, root.mtime, root.ctime), (NOW, NOW, NOW));
}

#[test]
fn on_disk_bytes() {
    let (disk, _fs) = formatted();

    let sb = disk.bytes(geometry::super_block_offset(), 24);
    assert_eq!(&sb[0..4], &MAGIC.to_le_bytes());
    assert_eq!(&sb[4..8], &0u32.to_le_bytes());
    assert_eq!(&sb[8..12], &63u32.to_le_bytes());
    assert_eq!(&sb[12..20], &1u64.to_le_bytes());
    assert_eq!(&sb[20..24], &575u32.to_le_bytes());

    let root_block = disk.bytes(geometry::data_block_offset(0), 512);
    assert_eq!(root_block[0], 0);
    assert_eq!(root_block[1], b'.');
    assert_eq!(root_block[32], 0);
    assert_eq!(&root_block[33..35], b"..");
    for slot in 2..16 {
        assert_eq!(root_block[slot * 32], DirEntry::UNUSED);
    }
}

#[test]
fn device_too_small() {
    let disk = Arc::new(RamDisk::new(MIN_DEVICE_BLOCKS));
    assert_eq!(
        zxfs::format(&*disk, MIN_DEVICE_BLOCKS - 1, 0),
        Err(Error::DeviceTooSmall)
    );
    // 没有写下任何东西
    assert!(disk.bytes(0, MIN_DEVICE_BLOCKS as usize * 512).iter().all(|&b| b == 0));

    assert_eq!(zxfs::format(&*disk, MIN_DEVICE_BLOCKS, 0), Ok(()));
}

#[test]
fn skip_region_untouched() {
    let disk = Arc::new(RamDisk::new(IMAGE_BLOCKS));
    disk.poke(0, &[0x5A; 2048]);
    ZxFileSystem::format(disk.clone(), IMAGE_BLOCKS, FixedClock(NOW)).unwrap();
    assert!(disk.bytes(0, 2048).iter().all(|&b| b == 0x5A));
}

#[test]
fn reformat_wipes_everything() {
    let (disk, fs) = formatted();
    let ino = fs.create(ROOT_INODE, "old", Default::default()).unwrap();
    fs.write(ino, 0, b"stale").unwrap();
    drop(fs);

    let fs = ZxFileSystem::format(disk.clone(), IMAGE_BLOCKS, FixedClock(NOW)).unwrap();
    assert_eq!(fs.lookup(ROOT_INODE, "old"), Err(Error::NotFound));
    assert_eq!(fs.super_block().snapshot().free_inodes as usize, MAX_INODES - 1);
    assert_eq!(fs.inode_table().read(ino).unwrap(), DiskInode::default());
}
