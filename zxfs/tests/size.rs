use zxfs::geometry::{DATA_START, INODE_TABLE_BLOCKS, MIN_DEVICE_BLOCKS};
use zxfs::{BLOCK_SIZE, DirEntry, DiskInode, MAX_FILE_SIZE, SuperBlock};

#[test]
fn volume() {
    assert_eq!(96, SuperBlock::SIZE);
    assert_eq!(64, DiskInode::SIZE);
    assert_eq!(32, DirEntry::SIZE);
    assert_eq!(8, INODE_TABLE_BLOCKS);
    assert_eq!(13, DATA_START);
    assert_eq!(589, MIN_DEVICE_BLOCKS);
    assert_eq!(9 * BLOCK_SIZE, MAX_FILE_SIZE);
}
