mod common;

use std::sync::Arc;

use common::{FixedClock, FlakyDisk, IMAGE_BLOCKS, NOW, formatted};
use zxfs::{
    Bitmap, Error, FsState, MAX_BLOCKS, MAX_INODES, SuperBlock, SuperBlockManager, ZxFileSystem,
};

fn assert_counters(sb: &SuperBlock) {
    assert_eq!(sb.free_inodes as usize, sb.inode_bitmap.count_zeros());
    assert_eq!(sb.free_blocks as usize, sb.block_bitmap.count_zeros());
}

#[test]
fn counters_track_bitmaps() {
    let (disk, fs) = formatted();
    let sb = fs.super_block();

    let mut held = Vec::new();
    for round in 0..5 {
        for _ in 0..10 {
            held.push(sb.allocate_inode().unwrap());
            assert_counters(&sb.snapshot());
        }
        for _ in 0..(3 + round) {
            let index = held.remove(round);
            sb.free_inode(index).unwrap();
            assert_counters(&sb.snapshot());
        }
    }
    assert_eq!(sb.snapshot().free_inodes as usize, MAX_INODES - 1 - held.len());
    // 每次修改都已落盘
    assert_eq!(SuperBlockManager::read(&*disk).unwrap(), sb.snapshot());
}

#[test]
fn lowest_index_first() {
    let (_disk, fs) = formatted();
    let sb = fs.super_block();

    assert_eq!(sb.allocate_inode(), Ok(1));
    assert_eq!(sb.allocate_inode(), Ok(2));
    assert_eq!(sb.allocate_inode(), Ok(3));
    sb.free_inode(2).unwrap();
    assert_eq!(sb.allocate_inode(), Ok(2));

    let blocks: Vec<_> = (0..40).map(|_| sb.allocate_block().unwrap()).collect();
    assert_eq!(blocks, (1..41).collect::<Vec<_>>());
    sb.free_block(33).unwrap();
    sb.free_block(7).unwrap();
    assert_eq!(sb.allocate_block(), Ok(7));
    assert_eq!(sb.allocate_block(), Ok(33));
}

#[test]
fn exhaustion() {
    let (_disk, fs) = formatted();
    let sb = fs.super_block();

    for _ in 1..MAX_INODES {
        sb.allocate_inode().unwrap();
    }
    assert_eq!(sb.allocate_inode(), Err(Error::NoSpace));

    for _ in 1..MAX_BLOCKS {
        sb.allocate_block().unwrap();
    }
    assert_eq!(sb.allocate_block(), Err(Error::NoSpace));
    assert_eq!(sb.snapshot().free_blocks, 0);
    assert_counters(&sb.snapshot());
}

#[test]
fn bad_frees() {
    let (_disk, fs) = formatted();
    let sb = fs.super_block();

    assert_eq!(sb.free_inode(9), Err(Error::DoubleFree));
    assert_eq!(sb.free_block(100), Err(Error::DoubleFree));
    assert_eq!(sb.free_inode(MAX_INODES as u32), Err(Error::InvalidIndex));
    assert_eq!(sb.free_block(MAX_BLOCKS as u32), Err(Error::InvalidIndex));
    // 失败的释放不影响任何状态
    assert_eq!(sb.snapshot().state, FsState::Valid);
    assert_eq!(sb.snapshot().free_blocks as usize, MAX_BLOCKS - 1);
}

#[test]
fn failed_persist_keeps_memory() {
    let disk = Arc::new(FlakyDisk::new(IMAGE_BLOCKS));
    let fs = ZxFileSystem::format(disk.clone(), IMAGE_BLOCKS, FixedClock(NOW)).unwrap();
    let sb = fs.super_block();
    let before = sb.snapshot();

    disk.fail_after(0);
    assert!(matches!(sb.allocate_block(), Err(Error::Io(_))));
    assert_eq!(sb.snapshot(), before);

    disk.heal();
    assert_eq!(sb.allocate_block(), Ok(1));
}

#[test]
fn marked_image_rejects_mutation() {
    let (disk, fs) = formatted();
    let sb = fs.super_block();

    sb.mark_error().unwrap();
    assert_eq!(sb.allocate_inode(), Err(Error::CorruptSuperblock));
    assert_eq!(sb.free_block(0), Err(Error::CorruptSuperblock));
    assert_eq!(
        SuperBlockManager::read(&*disk).unwrap().state,
        FsState::Error
    );
}
