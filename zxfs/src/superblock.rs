//! # 超级块管理器
//!
//! 内存中只保留一份超级块，由自旋锁保护；
//! 每次修改都先在副本上进行，落盘成功后才提交。

use alloc::sync::Arc;

use spin::Mutex;

use crate::geometry;
use crate::layout::{Bitmap, FsState, SuperBlock};
use crate::{BlockDevice, Error, Result};

pub struct SuperBlockManager {
    device: Arc<dyn BlockDevice>,
    inner: Mutex<SuperBlock>,
}

impl SuperBlockManager {
    /// 读出并校验超级块。
    ///
    /// 魔数错误或已处于错误状态都拒绝挂载；
    /// 计数与位图不符时，先把镜像标记为错误再拒绝。
    pub fn load(device: Arc<dyn BlockDevice>) -> Result<Self> {
        let sb = Self::read(&*device)?;
        if !sb.is_valid() {
            return Err(Error::CorruptSuperblock);
        }
        let consistent = sb.is_consistent();
        let manager = Self {
            device,
            inner: Mutex::new(sb),
        };
        if !consistent {
            manager.mark_error()?;
            return Err(Error::CorruptSuperblock);
        }
        Ok(manager)
    }

    /// 不做任何校验地读出超级块
    pub fn read(device: &dyn BlockDevice) -> Result<SuperBlock> {
        let mut bytes = [0u8; SuperBlock::SIZE];
        device.read_at(geometry::super_block_offset(), &mut bytes)?;
        Ok(SuperBlock::decode(&bytes))
    }

    /// 把完整的96字节记录写到4号块
    pub fn persist(device: &dyn BlockDevice, sb: &SuperBlock) -> Result<()> {
        let mut bytes = [0u8; SuperBlock::SIZE];
        sb.encode(&mut bytes);
        device.write_at(geometry::super_block_offset(), &bytes)?;
        Ok(())
    }

    pub fn mark_error(&self) -> Result<()> {
        let mut sb = self.inner.lock();
        Self::poison(&*self.device, &mut sb)
    }

    /// 镜像一旦被标记为错误，之后的所有操作都以`CorruptSuperblock`失败
    #[inline]
    pub fn ensure_valid(&self) -> Result<()> {
        if self.inner.lock().state == FsState::Valid {
            Ok(())
        } else {
            Err(Error::CorruptSuperblock)
        }
    }

    #[inline]
    pub fn snapshot(&self) -> SuperBlock {
        self.inner.lock().clone()
    }

    pub fn sync(&self) -> Result<()> {
        let sb = self.inner.lock();
        Self::persist(&*self.device, &sb)?;
        self.device.flush()?;
        Ok(())
    }

    #[inline]
    pub fn is_inode_allocated(&self, index: u32) -> bool {
        self.inner.lock().inode_bitmap.test(index as usize)
    }

    /// 在锁内对副本执行`f`，副本落盘后再替换内存中的超级块。
    ///
    /// `f`报告超级块损坏时，镜像被就地标记为错误。
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut SuperBlock) -> Result<T>) -> Result<T> {
        let mut sb = self.inner.lock();
        if sb.state != FsState::Valid {
            return Err(Error::CorruptSuperblock);
        }

        let mut staged = sb.clone();
        match f(&mut staged) {
            Ok(value) => {
                Self::persist(&*self.device, &staged)?;
                *sb = staged;
                Ok(value)
            }
            Err(Error::CorruptSuperblock) => {
                if let Err(err) = Self::poison(&*self.device, &mut sb) {
                    log::error!("failed to persist the error state: {err}");
                }
                Err(Error::CorruptSuperblock)
            }
            Err(err) => Err(err),
        }
    }

    /// 调用方须已持有锁
    fn poison(device: &dyn BlockDevice, sb: &mut SuperBlock) -> Result<()> {
        log::error!(
            "superblock marked corrupt: free inodes {} (bitmap {}), free blocks {} (bitmap {})",
            sb.free_inodes,
            sb.inode_bitmap.count_zeros(),
            sb.free_blocks,
            sb.block_bitmap.count_zeros(),
        );
        sb.state = FsState::Error;
        Self::persist(device, sb)
    }
}
