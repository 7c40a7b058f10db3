//! # 块设备接口层
//!
//! zxfs 只把块设备看作一段可随机读写的字节区间：
//! 在任意**字节偏移**处读出或写入若干字节。
//! 实现了 [`BlockDevice`] 的类型即为块设备驱动，
//! 读写调用返回时数据必须已经落到设备上。

#![no_std]

use core::any::Any;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 从`offset`处读满整个`buf`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError>;

    /// 把整个`buf`写到`offset`处
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), IoError>;

    /// 把驱动自身可能存在的缓冲刷到介质上
    fn flush(&self) -> Result<(), IoError> {
        Ok(())
    }
}

/// 底层设备的读写失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// 访问越过了设备末尾
    OutOfRange { offset: u64, len: usize },
    /// 读写的字节数不足
    ShortTransfer,
    /// 设备报告的其它错误
    Device,
}
