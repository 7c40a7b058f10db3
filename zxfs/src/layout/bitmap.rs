use alloc::string::String;

use crate::{MAX_BLOCKS, MAX_INODES};

/// 数据块位图的字数
pub const BLOCK_BITMAP_WORDS: usize = MAX_BLOCKS / 32;

/// 固定容量的位图，第 i 位为1表示第 i 项已分配。
///
/// 置位与清位都显式给出，并报告该位原先的状态，绝不翻转。
pub trait Bitmap {
    /// 位图所指示的项数
    const CAPACITY: usize;

    fn test(&self, index: usize) -> bool;

    /// 置位前该位必须为0；返回是否确实发生了变化
    fn set(&mut self, index: usize) -> bool;

    /// 清位前该位必须为1；返回是否确实发生了变化
    fn clear(&mut self, index: usize) -> bool;

    fn count_ones(&self) -> usize;

    /// 编号最小的空闲项
    fn first_clear(&self) -> Option<usize>;

    #[inline]
    fn count_zeros(&self) -> usize {
        Self::CAPACITY - self.count_ones()
    }

    /// 每位一个字符，按编号升序
    fn render(&self) -> String {
        (0..Self::CAPACITY)
            .map(|i| if self.test(i) { '1' } else { '0' })
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InodeBitmap(pub u64);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockBitmap(pub [u32; BLOCK_BITMAP_WORDS]);

impl Bitmap for InodeBitmap {
    const CAPACITY: usize = MAX_INODES;

    #[inline]
    fn test(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1 << index) != 0
    }

    fn set(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY || self.test(index) {
            return false;
        }
        self.0 |= 1 << index;
        true
    }

    fn clear(&mut self, index: usize) -> bool {
        if !self.test(index) {
            return false;
        }
        self.0 &= !(1 << index);
        true
    }

    #[inline]
    fn count_ones(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    fn first_clear(&self) -> Option<usize> {
        (self.0 != u64::MAX).then(|| self.0.trailing_ones() as usize)
    }
}

impl Bitmap for BlockBitmap {
    const CAPACITY: usize = MAX_BLOCKS;

    #[inline]
    fn test(&self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        index < Self::CAPACITY && self.0[word] & (1 << bit) != 0
    }

    fn set(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY || self.test(index) {
            return false;
        }
        let (word, bit) = Self::locate(index);
        self.0[word] |= 1 << bit;
        true
    }

    fn clear(&mut self, index: usize) -> bool {
        if !self.test(index) {
            return false;
        }
        let (word, bit) = Self::locate(index);
        self.0[word] &= !(1 << bit);
        true
    }

    fn count_ones(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    fn first_clear(&self) -> Option<usize> {
        // 字优先、位其次，均为升序
        self.0.iter().enumerate().find_map(|(word, &bits)| {
            (bits != u32::MAX).then(|| word * 32 + bits.trailing_ones() as usize)
        })
    }
}

impl BlockBitmap {
    /// 编号 -> (字索引, 字内位)；越界时落到0号字，由调用方先行校验
    #[inline]
    fn locate(index: usize) -> (usize, usize) {
        if index < Self::CAPACITY {
            (index / 32, index % 32)
        } else {
            (0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_free_first() {
        let mut map = InodeBitmap::default();
        assert_eq!(map.first_clear(), Some(0));
        assert!(map.set(0));
        assert!(map.set(1));
        assert!(map.set(3));
        assert_eq!(map.first_clear(), Some(2));
        assert!(map.clear(1));
        assert_eq!(map.first_clear(), Some(1));
    }

    #[test]
    fn set_and_clear_never_toggle() {
        let mut map = BlockBitmap::default();
        assert!(map.set(40));
        assert!(!map.set(40));
        assert!(map.test(40));
        assert!(map.clear(40));
        assert!(!map.clear(40));
        assert!(!map.test(40));
    }

    #[test]
    fn block_scan_is_word_major() {
        let mut map = BlockBitmap::default();
        map.0[0] = u32::MAX;
        map.0[1] = 0b1011;
        assert_eq!(map.first_clear(), Some(34));
        map.0 = [u32::MAX; BLOCK_BITMAP_WORDS];
        assert_eq!(map.first_clear(), None);
        assert_eq!(map.count_zeros(), 0);
    }

    #[test]
    fn out_of_range() {
        let mut inodes = InodeBitmap(u64::MAX);
        assert_eq!(inodes.first_clear(), None);
        assert!(!inodes.set(64));
        let mut blocks = BlockBitmap::default();
        assert!(!blocks.set(MAX_BLOCKS));
        assert!(!blocks.test(MAX_BLOCKS));
    }

    #[test]
    fn render_ascending() {
        let mut map = InodeBitmap::default();
        map.set(0);
        map.set(2);
        let bits = map.render();
        assert_eq!(bits.len(), 64);
        assert!(bits.starts_with("1010"));
        assert_eq!(BlockBitmap::default().render().len(), 576);
    }
}
