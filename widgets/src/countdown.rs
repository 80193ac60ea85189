use chrono::{DateTime, Utc};
use serde::Serialize;
use utils_common::models::parse_date_or_epoch;

/// 倒计时快照 - 剩余时间按天/时/分/秒分解
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownSnapshot {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// 目标时刻已过，页面显示"已开始"文案并停止刷新
    pub expired: bool,
}

impl CountdownSnapshot {
    fn expired() -> Self {
        CountdownSnapshot {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            expired: true,
        }
    }
}

/// 锦标赛倒计时
///
/// 目标日期来自卡片的data属性；无法解析的日期回退为纪元，
/// 即视为早已开始，而不是向调用方传播错误。
pub struct Countdown {
    target: DateTime<Utc>,
}

impl Countdown {
    pub fn new(raw_target: &str) -> Self {
        Countdown {
            target: parse_date_or_epoch(raw_target),
        }
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    /// 计算now时刻的剩余时间，分量永不为负
    pub fn snapshot(&self, now: DateTime<Utc>) -> CountdownSnapshot {
        let remaining = self.target - now;
        let total_seconds = remaining.num_seconds();
        if total_seconds <= 0 {
            return CountdownSnapshot::expired();
        }

        CountdownSnapshot {
            days: total_seconds / 86_400,
            hours: (total_seconds % 86_400) / 3_600,
            minutes: (total_seconds % 3_600) / 60,
            seconds: total_seconds % 60,
            expired: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_date_or_epoch(raw)
    }

    #[test]
    fn decomposes_remaining_time() {
        let countdown = Countdown::new("2025-06-02T10:30:45Z");
        let snap = countdown.snapshot(at("2025-06-01T08:15:30Z"));
        assert_eq!(
            snap,
            CountdownSnapshot {
                days: 1,
                hours: 2,
                minutes: 15,
                seconds: 15,
                expired: false,
            }
        );
    }

    #[test]
    fn expired_target_yields_terminal_snapshot() {
        let countdown = Countdown::new("2025-01-01");
        let snap = countdown.snapshot(at("2025-06-01"));
        assert!(snap.expired);
        assert_eq!((snap.days, snap.hours, snap.minutes, snap.seconds), (0, 0, 0, 0));
    }

    #[test]
    fn unparsable_target_counts_as_started() {
        let countdown = Countdown::new("soon(tm)");
        let snap = countdown.snapshot(at("2025-06-01"));
        assert!(snap.expired);
    }
}
