//! # 目录引擎
//!
//! 目录的数据就是一串32字节的目录项，按块序、槽序线性扫描。

use alloc::vec::Vec;

use crate::data;
use crate::file::FileMapping;
use crate::layout::{DirEntry, DiskInode, ENTRIES_PER_BLOCK};
use crate::{
    BLOCK_SIZE, BlockDevice, Error, InodeTable, MAX_NAME_LEN, Result, SuperBlockManager,
};

/// 目录项在目录中的位置：(第几个直接索引块, 块内槽号)
type Slot = (usize, usize);

pub struct DirEngine<'a> {
    device: &'a dyn BlockDevice,
    sb: &'a SuperBlockManager,
    inodes: &'a InodeTable,
    now: u32,
}

impl<'a> DirEngine<'a> {
    pub fn new(
        device: &'a dyn BlockDevice,
        sb: &'a SuperBlockManager,
        inodes: &'a InodeTable,
        now: u32,
    ) -> Self {
        Self {
            device,
            sb,
            inodes,
            now,
        }
    }

    /// 名字不能为空，不能含`/`或`\0`，且不超过31字节
    pub fn validate_name(name: &[u8]) -> Result<()> {
        if name.is_empty() || name.iter().any(|&c| c == b'/' || c == 0) {
            return Err(Error::InvalidName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong);
        }
        Ok(())
    }

    pub fn lookup(&self, dir: u32, name: &[u8]) -> Result<u32> {
        let dir_inode = self.load_dir(dir)?;
        self.find(&dir_inode, name)?
            .and_then(|(_, entry)| entry.inode())
            .ok_or(Error::NotFound)
    }

    /// 所有有效目录项，按槽序
    pub fn entries(&self, dir: u32) -> Result<Vec<DirEntry>> {
        let dir_inode = self.load_dir(dir)?;
        let mut entries = Vec::new();
        self.scan(&dir_inode, |_, entry| {
            if !entry.is_unused() {
                entries.push(entry.clone());
            }
            false
        })?;
        Ok(entries)
    }

    /// 只剩`.`与`..`
    pub fn is_empty(&self, dir: u32) -> Result<bool> {
        let dir_inode = self.load_dir(dir)?;
        let mut empty = true;
        self.scan(&dir_inode, |_, entry| {
            if !entry.is_unused() && entry.name() != b"." && entry.name() != b".." {
                empty = false;
            }
            !empty
        })?;
        Ok(empty)
    }

    /// 在`dir`中加入指向`target`的`name`，并增加`target`的链接数
    pub fn insert(&self, dir: u32, name: &[u8], target: u32) -> Result<()> {
        Self::validate_name(name)?;
        let mut dir_inode = self.load_dir(dir)?;

        let mut free = None;
        let mut exists = false;
        self.scan(&dir_inode, |slot, entry| {
            if entry.is_unused() {
                free.get_or_insert(slot);
            } else if entry.name() == name {
                exists = true;
            }
            exists
        })?;
        if exists {
            return Err(Error::AlreadyExists);
        }

        let (window, index) = match free {
            Some(slot) => slot,
            None => self.extend(&mut dir_inode)?,
        };

        let id = dir_inode.direct[window];
        let mut block = [0u8; BLOCK_SIZE];
        data::read_block(self.device, id, &mut block)?;
        DirEntry::new(name, target).encode(&mut block[index * DirEntry::SIZE..]);
        data::write_block(self.device, id, &block)?;

        if target == dir {
            dir_inode.links += 1;
        } else {
            let mut inode = self.inodes.read(target)?;
            inode.links += 1;
            inode.ctime = self.now;
            self.inodes.write(target, &inode)?;
        }

        dir_inode.touch(self.now);
        self.inodes.write(dir, &dir_inode)
    }

    /// 移除`name`并减少其目标的链接数，减到0时回收目标。
    ///
    /// 返回被移除项所指的 inode
    pub fn remove(&self, dir: u32, name: &[u8]) -> Result<u32> {
        let mut dir_inode = self.load_dir(dir)?;
        let ((window, index), entry) = self.find(&dir_inode, name)?.ok_or(Error::NotFound)?;
        let target = entry.inode().ok_or(Error::NotFound)?;

        let id = dir_inode.direct[window];
        let mut block = [0u8; BLOCK_SIZE];
        data::read_block(self.device, id, &mut block)?;
        DirEntry::unused().encode(&mut block[index * DirEntry::SIZE..]);
        data::write_block(self.device, id, &block)?;

        if target == dir {
            dir_inode.links = dir_inode.links.saturating_sub(1);
        } else {
            self.drop_link(target)?;
        }

        dir_inode.touch(self.now);
        self.inodes.write(dir, &dir_inode)?;
        Ok(target)
    }

    /// 初始化新目录的`.`与`..`
    pub fn bootstrap(&self, dir: u32, parent: u32) -> Result<()> {
        self.insert(dir, b".", dir)?;
        self.insert(dir, b"..", parent)
    }

    fn drop_link(&self, target: u32) -> Result<()> {
        let mut inode = self.inodes.read(target)?;
        inode.links = inode.links.saturating_sub(1);
        if inode.links > 0 {
            inode.ctime = self.now;
            return self.inodes.write(target, &inode);
        }

        FileMapping::new(self.device, self.sb).release_all(&mut inode)?;
        self.sb.free_inode(target)?;
        self.inodes.write(target, &DiskInode::default())
    }

    /// 新增一个全是空槽位的块。
    ///
    /// 新目录连第一个块都分配不到时报告`NoSpace`，而不是`DirectoryFull`
    fn extend(&self, dir_inode: &mut DiskInode) -> Result<Slot> {
        let window = dir_inode.blocks as usize;
        FileMapping::new(self.device, self.sb)
            .grow_to(dir_inode, window + 1)
            .map_err(|err| match err {
                Error::NoSpace if window == 0 => Error::NoSpace,
                Error::FileTooLarge | Error::NoSpace => Error::DirectoryFull,
                err => err,
            })?;
        data::write_block(self.device, dir_inode.direct[window], &DirEntry::unused_block())?;
        dir_inode.size = (dir_inode.blocks as usize * BLOCK_SIZE) as u16;
        Ok((window, 0))
    }

    fn find(&self, dir_inode: &DiskInode, name: &[u8]) -> Result<Option<(Slot, DirEntry)>> {
        let mut found = None;
        self.scan(dir_inode, |slot, entry| {
            if !entry.is_unused() && entry.name() == name {
                found = Some((slot, entry.clone()));
            }
            found.is_some()
        })?;
        Ok(found)
    }

    /// 逐项遍历，`visit`返回`true`时提前结束
    fn scan(
        &self,
        dir_inode: &DiskInode,
        mut visit: impl FnMut(Slot, &DirEntry) -> bool,
    ) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        for (window, &id) in dir_inode.direct_blocks().iter().enumerate() {
            data::read_block(self.device, id, &mut block)?;
            for (index, entry) in DirEntry::decode_block(&block).iter().enumerate() {
                if visit((window, index), entry) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn load_dir(&self, dir: u32) -> Result<DiskInode> {
        let inode = self.inodes.read(dir)?;
        if inode.is_dir() {
            Ok(inode)
        } else {
            Err(Error::NotADirectory)
        }
    }
}

const _: () = assert!(ENTRIES_PER_BLOCK * DirEntry::SIZE == BLOCK_SIZE);
