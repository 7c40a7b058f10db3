//! # 挂载层
//!
//! [`ZxFileSystem`] 管理一个已挂载的镜像：超级块、inode 表与时钟。
//! 所有操作以 inode 编号寻址，目录与文件的区分由 inode 的类型标签决定。

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use enumflags2::BitFlags;

use crate::dir::DirEngine;
use crate::file::FileMapping;
use crate::layout::{DirEntry, DiskInode, InodeKind, Permission};
use crate::{
    BlockDevice, Clock, Error, InodeTable, MAX_INODES, MAX_LINKS, NoClock, ROOT_INODE, Result,
    SuperBlockManager, mkfs,
};

pub struct ZxFileSystem {
    device: Arc<dyn BlockDevice>,
    super_block: SuperBlockManager,
    inodes: InodeTable,
    clock: Box<dyn Clock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub ino: u32,
    pub kind: InodeKind,
    pub permissions: BitFlags<Permission>,
    pub links: u16,
    pub size: u16,
    pub blocks: u16,
    pub uid: u16,
    pub gid: u16,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
}

impl ZxFileSystem {
    /// 格式化后立即挂载
    pub fn format(
        device: Arc<dyn BlockDevice>,
        total_blocks: u32,
        clock: impl Clock + 'static,
    ) -> Result<Arc<Self>> {
        mkfs::format(&*device, total_blocks, clock.now())?;
        Self::mount_with(device, clock)
    }

    /// 不带时钟挂载，之后写下的时间戳全部为0。
    ///
    /// 与 [`mount_with`](Self::mount_with) 一样建立新的超级块所有者。
    #[inline]
    pub fn mount(device: Arc<dyn BlockDevice>) -> Result<Arc<Self>> {
        Self::mount_with(device, NoClock)
    }

    /// 读出超级块并建立新的所有者：独立的内存副本与锁。
    ///
    /// 同一设备在进程内只应挂载一次，
    /// 其它挂载点必须通过 [`mount_point`](Self::mount_point) 共享已有的实例，
    /// 否则两份位图会分配出相同的编号。
    pub fn mount_with(
        device: Arc<dyn BlockDevice>,
        clock: impl Clock + 'static,
    ) -> Result<Arc<Self>> {
        let super_block = SuperBlockManager::load(device.clone())?;
        let inodes = InodeTable::new(device.clone());
        if !inodes.read(ROOT_INODE)?.is_dir() {
            return Err(Error::NotADirectory);
        }

        let sb = super_block.snapshot();
        log::info!(
            "mounted zxfs: {} free inodes, {} free blocks",
            sb.free_inodes,
            sb.free_blocks
        );

        Ok(Arc::new(Self {
            device,
            super_block,
            inodes,
            clock: Box::new(clock),
        }))
    }

    /// 同一镜像的另一个挂载点，与`self`共享超级块与锁
    #[inline]
    pub fn mount_point(self: &Arc<Self>) -> Arc<Self> {
        Arc::clone(self)
    }

    #[inline]
    pub fn root(&self) -> u32 {
        ROOT_INODE
    }

    pub fn lookup(&self, dir: u32, name: &str) -> Result<u32> {
        self.super_block.ensure_valid()?;
        self.load(dir)?;
        self.engine().lookup(dir, name.as_bytes())
    }

    pub fn readdir(&self, dir: u32) -> Result<Vec<DirEntry>> {
        self.super_block.ensure_valid()?;
        self.load(dir)?;
        self.engine().entries(dir)
    }

    /// 在`dir`下创建空的普通文件
    pub fn create(&self, dir: u32, name: &str, perm: BitFlags<Permission>) -> Result<u32> {
        self.prepare_entry(dir, name)?;

        let ino = self.super_block.allocate_inode()?;
        let inode = DiskInode::new(InodeKind::File, perm, self.now());
        let result = self
            .inodes
            .write(ino, &inode)
            .and_then(|()| self.engine().insert(dir, name.as_bytes(), ino));
        match result {
            Ok(()) => Ok(ino),
            Err(err) => {
                self.abandon(ino);
                Err(err)
            }
        }
    }

    /// 新目录的权限为`0o755`，自身带`.`与`..`
    pub fn mkdir(&self, dir: u32, name: &str) -> Result<u32> {
        self.prepare_entry(dir, name)?;

        let ino = self.super_block.allocate_inode()?;
        let inode = DiskInode::new(InodeKind::Directory, Permission::dir_default(), self.now());
        let engine = self.engine();
        let result = self
            .inodes
            .write(ino, &inode)
            .and_then(|()| engine.bootstrap(ino, dir))
            .and_then(|()| engine.insert(dir, name.as_bytes(), ino));
        match result {
            Ok(()) => Ok(ino),
            Err(err) => {
                // `..`可能已经计入父目录的链接数
                if let Err(undo) = engine.remove(ino, b"..") {
                    log::warn!("rollback of directory {ino} left `..`: {undo}");
                }
                self.abandon(ino);
                Err(err)
            }
        }
    }

    /// 删除普通文件的一个名字
    pub fn unlink(&self, dir: u32, name: &str) -> Result<()> {
        self.super_block.ensure_valid()?;
        if is_dot(name) {
            return Err(Error::InvalidName);
        }
        self.load(dir)?;
        let engine = self.engine();
        let target = engine.lookup(dir, name.as_bytes())?;
        if self.inodes.read(target)?.is_dir() {
            return Err(Error::IsADirectory);
        }
        engine.remove(dir, name.as_bytes())?;
        Ok(())
    }

    /// 删除空目录
    pub fn rmdir(&self, dir: u32, name: &str) -> Result<()> {
        self.super_block.ensure_valid()?;
        if is_dot(name) {
            return Err(Error::InvalidName);
        }
        self.load(dir)?;
        let engine = self.engine();
        let target = engine.lookup(dir, name.as_bytes())?;
        if !self.inodes.read(target)?.is_dir() {
            return Err(Error::NotADirectory);
        }
        if !engine.is_empty(target)? {
            return Err(Error::DirectoryNotEmpty);
        }

        engine.remove(target, b"..")?;
        engine.remove(target, b".")?;
        engine.remove(dir, name.as_bytes())?;
        Ok(())
    }

    /// 为普通文件`ino`再建一个名字
    pub fn link(&self, dir: u32, name: &str, ino: u32) -> Result<()> {
        self.super_block.ensure_valid()?;
        self.load(dir)?;
        let target = self.load(ino)?;
        if target.is_dir() {
            return Err(Error::IsADirectory);
        }
        if target.links >= MAX_LINKS {
            return Err(Error::TooManyLinks);
        }
        self.engine().insert(dir, name.as_bytes(), ino)
    }

    /// 读出`[offset, offset + len)`，超出文件末尾的部分被截掉
    pub fn read(&self, ino: u32, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.super_block.ensure_valid()?;
        let inode = self.load_file(ino)?;
        self.mapping().read(&inode, offset, len)
    }

    pub fn read_at(&self, ino: u32, offset: usize, buf: &mut [u8]) -> Result<usize> {
        self.super_block.ensure_valid()?;
        let inode = self.load_file(ino)?;
        self.mapping().read_into(&inode, offset, buf)
    }

    pub fn write(&self, ino: u32, offset: usize, bytes: &[u8]) -> Result<usize> {
        self.super_block.ensure_valid()?;
        let mut inode = self.load_file(ino)?;
        let result = self.mapping().write(&mut inode, offset, bytes, self.now());
        // 失败时 inode 也可能已经变化，一并写回
        self.inodes.write(ino, &inode)?;
        result
    }

    pub fn truncate(&self, ino: u32, size: usize) -> Result<()> {
        self.super_block.ensure_valid()?;
        let mut inode = self.load_file(ino)?;
        let result = self.mapping().truncate(&mut inode, size, self.now());
        self.inodes.write(ino, &inode)?;
        result
    }

    pub fn stat(&self, ino: u32) -> Result<Stat> {
        self.super_block.ensure_valid()?;
        let inode = self.load(ino)?;
        Ok(Stat {
            ino,
            kind: inode.kind().ok_or(Error::NotFound)?,
            permissions: inode.permissions(),
            links: inode.links,
            size: inode.size,
            blocks: inode.blocks,
            uid: inode.uid,
            gid: inode.gid,
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
        })
    }

    /// 超级块落盘并刷新设备
    pub fn sync(&self) -> Result<()> {
        self.super_block.sync()
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlockManager {
        &self.super_block
    }

    #[inline]
    pub fn inode_table(&self) -> &InodeTable {
        &self.inodes
    }

    #[inline]
    pub fn device(&self) -> &Arc<dyn BlockDevice> {
        &self.device
    }
}

impl ZxFileSystem {
    #[inline]
    fn now(&self) -> u32 {
        self.clock.now()
    }

    #[inline]
    fn engine(&self) -> DirEngine<'_> {
        DirEngine::new(&*self.device, &self.super_block, &self.inodes, self.now())
    }

    #[inline]
    fn mapping(&self) -> FileMapping<'_> {
        FileMapping::new(&*self.device, &self.super_block)
    }

    /// 只有已分配且类型可识别的 inode 才能访问
    fn load(&self, ino: u32) -> Result<DiskInode> {
        if ino as usize >= MAX_INODES {
            return Err(Error::InvalidIndex);
        }
        if !self.super_block.is_inode_allocated(ino) {
            return Err(Error::NotFound);
        }
        let inode = self.inodes.read(ino)?;
        if inode.kind().is_none() {
            return Err(Error::NotFound);
        }
        Ok(inode)
    }

    fn load_file(&self, ino: u32) -> Result<DiskInode> {
        let inode = self.load(ino)?;
        if inode.is_dir() {
            return Err(Error::IsADirectory);
        }
        Ok(inode)
    }

    /// 新建目录项之前的检查：名字合法、父目录存在且无同名项
    fn prepare_entry(&self, dir: u32, name: &str) -> Result<()> {
        self.super_block.ensure_valid()?;
        DirEngine::validate_name(name.as_bytes())?;
        self.load(dir)?;
        match self.engine().lookup(dir, name.as_bytes()) {
            Ok(_) => Err(Error::AlreadyExists),
            Err(Error::NotFound) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// 回收创建失败的 inode 及其数据块
    fn abandon(&self, ino: u32) {
        let undo = self
            .inodes
            .read(ino)
            .and_then(|mut inode| self.mapping().release_all(&mut inode))
            .and_then(|()| self.super_block.free_inode(ino))
            .and_then(|()| self.inodes.write(ino, &DiskInode::default()));
        if let Err(err) = undo {
            log::warn!("failed to roll back inode {ino}: {err}");
        }
    }
}

#[inline]
fn is_dot(name: &str) -> bool {
    name == "." || name == ".."
}
