/// 自动轮播的逻辑计时器
///
/// 不直接持有浏览器定时器，只记录下一次触发的时刻，由页面脚本
/// 以单调时钟驱动tick。一个轮播实例最多持有一个计时器，结构上
/// 排除了重复计时器叠加导致双倍速前进的问题。
#[derive(Debug, Clone, Copy)]
pub struct AutoAdvance {
    interval_ms: f64,
    deadline: Option<f64>,
}

impl AutoAdvance {
    pub fn new(interval_ms: f64) -> Self {
        AutoAdvance {
            interval_ms,
            deadline: None,
        }
    }

    /// 从现在起重新武装一个完整周期
    pub fn arm(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.interval_ms);
    }

    /// 暂停 - 清除待触发时刻
    pub fn suspend(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// 到期时返回true并重新武装一个完整周期，未到期返回false
    fn fire(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = Some(now_ms + self.interval_ms);
                true
            }
            _ => false,
        }
    }
}

/// 轮播状态机 - 任意时刻只有一张激活的幻灯片
///
/// index是幻灯片与指示点共同的唯一数据源，切换对两者是原子的，
/// 不存在幻灯片与指示点不一致的中间状态。
pub struct Carousel {
    index: usize,
    len: usize,
    auto: Option<AutoAdvance>,
}

impl Carousel {
    pub fn new(len: usize) -> Result<Self, String> {
        if len == 0 {
            return Err("轮播必须至少包含一张幻灯片".to_string());
        }
        Ok(Carousel {
            index: 0,
            len,
            auto: None,
        })
    }

    /// 启用自动前进并立即武装计时器
    pub fn enable_auto_advance(&mut self, interval_ms: f64, now_ms: f64) {
        let mut auto = AutoAdvance::new(interval_ms);
        auto.arm(now_ms);
        self.auto = Some(auto);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    pub fn prev(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }

    /// 跳转到第k张，负数和越界都按模回绕
    pub fn go_to(&mut self, k: i64) -> usize {
        let n = self.len as i64;
        self.index = (((k % n) + n) % n) as usize;
        self.index
    }

    /// 悬停暂停 - 挂起计时器，已经过的时间不保留
    pub fn suspend(&mut self) {
        if let Some(auto) = &mut self.auto {
            auto.suspend();
        }
    }

    /// 恢复 - 从一个全新的完整周期开始计时
    pub fn resume(&mut self, now_ms: f64) {
        if let Some(auto) = &mut self.auto {
            auto.arm(now_ms);
        }
    }

    pub fn is_auto_armed(&self) -> bool {
        self.auto.map(|a| a.is_armed()).unwrap_or(false)
    }

    /// 驱动自动前进；计时器到期时前进一张并返回新索引
    pub fn tick(&mut self, now_ms: f64) -> Option<usize> {
        let fired = match &mut self.auto {
            Some(auto) => auto.fire(now_ms),
            None => false,
        };
        if fired {
            Some(self.next())
        } else {
            None
        }
    }
}
