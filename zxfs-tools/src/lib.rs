//! 宿主机上的 zxfs 工具：把镜像文件当作块设备，
//! 供`mkzx`格式化、`dbzx`检查。

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use block_dev::{BlockDevice, IoError};
use zxfs::inspect::Inspector;
use zxfs::{BLOCK_SIZE, Clock};

/// 以镜像文件为介质的块设备
pub struct BlockFile(pub Mutex<File>);

impl BlockFile {
    /// 新建（或清空）一个`blocks`块大小的镜像
    pub fn create(path: &Path, blocks: u32) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len(blocks as u64 * BLOCK_SIZE as u64)?;
        Ok(Self(Mutex::new(fd)))
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        let fd = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self(Mutex::new(fd)))
    }

    pub fn open_read_only(path: &Path) -> io::Result<Self> {
        Ok(Self(Mutex::new(File::open(path)?)))
    }

    /// 镜像包含的完整块数
    pub fn blocks(&self) -> io::Result<u32> {
        let file = self.0.lock().map_err(|_| io::Error::other("image lock poisoned"))?;
        let blocks = file.metadata()?.len() / BLOCK_SIZE as u64;
        u32::try_from(blocks).map_err(|_| io::Error::new(ErrorKind::InvalidInput, "image too large"))
    }
}

impl BlockDevice for BlockFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let mut file = self.0.lock().map_err(|_| IoError::Device)?;
        file.seek(SeekFrom::Start(offset)).map_err(io_error)?;
        file.read_exact(buf).map_err(io_error)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), IoError> {
        let mut file = self.0.lock().map_err(|_| IoError::Device)?;
        file.seek(SeekFrom::Start(offset)).map_err(io_error)?;
        file.write_all(buf).map_err(io_error)
    }

    fn flush(&self) -> Result<(), IoError> {
        let file = self.0.lock().map_err(|_| IoError::Device)?;
        file.sync_all().map_err(io_error)
    }
}

fn io_error(err: io::Error) -> IoError {
    log::debug!("image I/O failed: {err}");
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::WriteZero => IoError::ShortTransfer,
        _ => IoError::Device,
    }
}

/// 系统时间，精确到秒
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0)
    }
}

/// `dbzx`可以检查的结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Super,
    Inode(u32),
    /// 数据区内的块索引
    Dir(u32),
    /// 数据区内的块索引
    Block(u32),
    /// 设备块号
    DeviceBlock(u32),
}

pub fn inspect(device: &dyn BlockDevice, what: Structure) -> zxfs::Result<String> {
    let inspector = Inspector::new(device);
    Ok(match what {
        Structure::Super => inspector.superblock()?.to_string(),
        Structure::Inode(index) => inspector.inode(index)?.to_string(),
        Structure::Dir(block) => inspector.dir_block(block)?.to_string(),
        Structure::Block(block) => inspector.raw_block(block)?.to_string(),
        Structure::DeviceBlock(block) => inspector.device_block(block)?.to_string(),
    })
}
