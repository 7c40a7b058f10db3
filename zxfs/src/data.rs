//! 数据区的整块读写，块号均为数据区内的索引

use crate::geometry;
use crate::{BLOCK_SIZE, BlockDevice, DataBlock, Error, MAX_BLOCKS, Result};

pub fn read_block(device: &dyn BlockDevice, block: u32, buf: &mut DataBlock) -> Result<()> {
    check(block)?;
    device.read_at(geometry::data_block_offset(block), buf)?;
    Ok(())
}

pub fn write_block(device: &dyn BlockDevice, block: u32, buf: &DataBlock) -> Result<()> {
    check(block)?;
    device.write_at(geometry::data_block_offset(block), buf)?;
    Ok(())
}

#[inline]
pub fn zeroize(device: &dyn BlockDevice, block: u32) -> Result<()> {
    write_block(device, block, &[0; BLOCK_SIZE])
}

#[inline]
fn check(block: u32) -> Result<()> {
    if (block as usize) < MAX_BLOCKS {
        Ok(())
    } else {
        Err(Error::InvalidIndex)
    }
}
