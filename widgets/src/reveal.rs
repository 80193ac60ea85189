use std::collections::HashSet;

/// 滚动显现跟踪器 - 保证每个元素的入场动画只触发一次
///
/// 页面脚本在元素进入视口时调用reveal，返回true才播放动画
/// 并解除对该元素的观察，避免重复触发。
#[derive(Default)]
pub struct RevealTracker {
    seen: HashSet<String>,
}

impl RevealTracker {
    pub fn new() -> Self {
        RevealTracker::default()
    }

    /// 首次显现返回true，之后对同一元素永远返回false
    pub fn reveal(&mut self, element_id: &str) -> bool {
        self.seen.insert(element_id.to_string())
    }

    pub fn is_revealed(&self, element_id: &str) -> bool {
        self.seen.contains(element_id)
    }

    pub fn revealed_count(&self) -> usize {
        self.seen.len()
    }
}
