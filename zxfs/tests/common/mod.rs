#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use zxfs::{BLOCK_SIZE, BlockDevice, Clock, IoError, ZxFileSystem};

pub const IMAGE_BLOCKS: u32 = 600;
pub const NOW: u32 = 1_700_000_000;

/// 内存中的块设备
pub struct RamDisk(Mutex<Vec<u8>>);

impl RamDisk {
    pub fn new(blocks: u32) -> Self {
        Self(Mutex::new(vec![0; blocks as usize * BLOCK_SIZE]))
    }

    pub fn bytes(&self, offset: u64, len: usize) -> Vec<u8> {
        let disk = self.0.lock().unwrap();
        disk[offset as usize..offset as usize + len].to_vec()
    }

    pub fn poke(&self, offset: u64, bytes: &[u8]) {
        let mut disk = self.0.lock().unwrap();
        disk[offset as usize..offset as usize + bytes.len()].copy_from_slice(bytes);
    }
}

impl BlockDevice for RamDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let disk = self.0.lock().unwrap();
        let start = offset as usize;
        let src = disk
            .get(start..start + buf.len())
            .ok_or(IoError::OutOfRange {
                offset,
                len: buf.len(),
            })?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), IoError> {
        let mut disk = self.0.lock().unwrap();
        let start = offset as usize;
        let dst = disk
            .get_mut(start..start + buf.len())
            .ok_or(IoError::OutOfRange {
                offset,
                len: buf.len(),
            })?;
        dst.copy_from_slice(buf);
        Ok(())
    }
}

/// 前`budget`次写入正常，之后所有写入都失败
pub struct FlakyDisk {
    pub inner: RamDisk,
    budget: AtomicUsize,
}

impl FlakyDisk {
    pub fn new(blocks: u32) -> Self {
        Self {
            inner: RamDisk::new(blocks),
            budget: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn fail_after(&self, writes: usize) {
        self.budget.store(writes, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.budget.store(usize::MAX, Ordering::SeqCst);
    }
}

impl BlockDevice for FlakyDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        self.inner.read_at(offset, buf)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), IoError> {
        let left = self.budget.load(Ordering::SeqCst);
        if left == 0 {
            return Err(IoError::Device);
        }
        if left != usize::MAX {
            self.budget.store(left - 1, Ordering::SeqCst);
        }
        self.inner.write_at(offset, buf)
    }
}

pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now(&self) -> u32 {
        self.0
    }
}

/// 格式化并挂载一个600块的内存镜像
pub fn formatted() -> (Arc<RamDisk>, Arc<ZxFileSystem>) {
    let disk = Arc::new(RamDisk::new(IMAGE_BLOCKS));
    let fs = ZxFileSystem::format(disk.clone(), IMAGE_BLOCKS, FixedClock(NOW)).unwrap();
    (disk, fs)
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 512) as u8).collect()
}
