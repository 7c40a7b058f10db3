//! # 索引节点句柄
//!
//! 打开 inode 时按类型标签选出 [`Node::File`] 或 [`Node::Dir`]，
//! 两者各自只暴露适用的操作。

use alloc::sync::Arc;
use alloc::vec::Vec;

use enumflags2::BitFlags;

use crate::fs::{Stat, ZxFileSystem};
use crate::layout::{DirEntry, InodeKind, Permission};
use crate::{Error, Result};

pub enum Node {
    File(FileNode),
    Dir(DirNode),
}

#[derive(Clone)]
pub struct FileNode {
    fs: Arc<ZxFileSystem>,
    ino: u32,
}

#[derive(Clone)]
pub struct DirNode {
    fs: Arc<ZxFileSystem>,
    ino: u32,
}

impl ZxFileSystem {
    pub fn open(self: &Arc<Self>, ino: u32) -> Result<Node> {
        let fs = self.clone();
        Ok(match self.stat(ino)?.kind {
            InodeKind::File => Node::File(FileNode { fs, ino }),
            InodeKind::Directory => Node::Dir(DirNode { fs, ino }),
        })
    }

    #[inline]
    pub fn root_dir(self: &Arc<Self>) -> DirNode {
        DirNode {
            fs: self.clone(),
            ino: self.root(),
        }
    }
}

impl Node {
    #[inline]
    pub fn ino(&self) -> u32 {
        match self {
            Self::File(file) => file.ino,
            Self::Dir(dir) => dir.ino,
        }
    }

    pub fn stat(&self) -> Result<Stat> {
        match self {
            Self::File(file) => file.stat(),
            Self::Dir(dir) => dir.stat(),
        }
    }

    pub fn into_file(self) -> Result<FileNode> {
        match self {
            Self::File(file) => Ok(file),
            Self::Dir(_) => Err(Error::IsADirectory),
        }
    }

    pub fn into_dir(self) -> Result<DirNode> {
        match self {
            Self::Dir(dir) => Ok(dir),
            Self::File(_) => Err(Error::NotADirectory),
        }
    }
}

impl FileNode {
    #[inline]
    pub fn ino(&self) -> u32 {
        self.ino
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.fs.read(self.ino, offset, len)
    }

    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        self.fs.read_at(self.ino, offset, buf)
    }

    pub fn write(&self, offset: usize, bytes: &[u8]) -> Result<usize> {
        self.fs.write(self.ino, offset, bytes)
    }

    pub fn truncate(&self, size: usize) -> Result<()> {
        self.fs.truncate(self.ino, size)
    }

    pub fn stat(&self) -> Result<Stat> {
        self.fs.stat(self.ino)
    }
}

impl DirNode {
    #[inline]
    pub fn ino(&self) -> u32 {
        self.ino
    }

    pub fn lookup(&self, name: &str) -> Result<Node> {
        let ino = self.fs.lookup(self.ino, name)?;
        self.fs.open(ino)
    }

    pub fn create(&self, name: &str, perm: BitFlags<Permission>) -> Result<FileNode> {
        let ino = self.fs.create(self.ino, name, perm)?;
        Ok(FileNode {
            fs: self.fs.clone(),
            ino,
        })
    }

    pub fn mkdir(&self, name: &str) -> Result<DirNode> {
        let ino = self.fs.mkdir(self.ino, name)?;
        Ok(DirNode {
            fs: self.fs.clone(),
            ino,
        })
    }

    pub fn unlink(&self, name: &str) -> Result<()> {
        self.fs.unlink(self.ino, name)
    }

    pub fn rmdir(&self, name: &str) -> Result<()> {
        self.fs.rmdir(self.ino, name)
    }

    pub fn link(&self, name: &str, file: &FileNode) -> Result<()> {
        self.fs.link(self.ino, name, file.ino)
    }

    pub fn readdir(&self) -> Result<Vec<DirEntry>> {
        self.fs.readdir(self.ino)
    }

    pub fn stat(&self) -> Result<Stat> {
        self.fs.stat(self.ino)
    }
}
