/// 时间戳来源，单位为秒
pub trait Clock: Send + Sync {
    fn now(&self) -> u32;
}

/// 没有时钟可用时，所有时间戳都为0
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClock;

impl Clock for NoClock {
    #[inline]
    fn now(&self) -> u32 {
        0
    }
}
