use crate::{BLOCK_SIZE, DataBlock, MAX_INODES, MAX_NAME_LEN};

pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DirEntry::SIZE;

/// 目录项：1字节 inode 编号 + 31字节名字（以\0补齐）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    inode: u8,
    name: [u8; MAX_NAME_LEN],
}

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;

    /// 空槽位标记。0号是根 inode，不能用来表示空
    pub const UNUSED: u8 = 0xFF;

    /// `name` 的合法性由目录引擎负责
    pub fn new(name: &[u8], inode: u32) -> Self {
        debug_assert!(name.len() <= MAX_NAME_LEN);
        debug_assert!((inode as usize) < MAX_INODES);
        let len = name.len().min(MAX_NAME_LEN);
        let mut raw = [0; MAX_NAME_LEN];
        raw[..len].copy_from_slice(&name[..len]);
        Self {
            inode: inode as u8,
            name: raw,
        }
    }

    #[inline]
    pub const fn unused() -> Self {
        Self {
            inode: Self::UNUSED,
            name: [0; MAX_NAME_LEN],
        }
    }

    #[inline]
    pub fn is_unused(&self) -> bool {
        self.inode == Self::UNUSED
    }

    /// 空槽位没有 inode
    #[inline]
    pub fn inode(&self) -> Option<u32> {
        (!self.is_unused()).then_some(self.inode as u32)
    }

    pub fn name(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(MAX_NAME_LEN);
        &self.name[..len]
    }

    pub fn decode(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= Self::SIZE);
        let mut name = [0; MAX_NAME_LEN];
        name.copy_from_slice(&bytes[1..Self::SIZE]);
        Self {
            inode: bytes[0],
            name,
        }
    }

    pub fn encode(&self, bytes: &mut [u8]) {
        assert!(bytes.len() >= Self::SIZE);
        bytes[0] = self.inode;
        bytes[1..Self::SIZE].copy_from_slice(&self.name);
    }

    /// 全是空槽位的目录块
    pub fn unused_block() -> DataBlock {
        let mut block = [0; BLOCK_SIZE];
        for slot in block.chunks_exact_mut(Self::SIZE) {
            Self::unused().encode(slot);
        }
        block
    }

    /// 把一个数据块拆成16个目录项
    pub fn decode_block(block: &DataBlock) -> [DirEntry; ENTRIES_PER_BLOCK] {
        core::array::from_fn(|i| Self::decode(&block[i * Self::SIZE..]))
    }
}
