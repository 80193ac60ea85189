use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 卡片元数据 - 存储页面上一个可筛选卡片的基本信息
/// （锦标赛卡片、新闻条目、游戏卡片都用同一个结构表示）
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CardMetadata {
    /// 卡片唯一标识符（页面路径 + 位置，或显式id属性）
    pub id: String,
    /// 卡片标题
    pub title: String,
    /// 卡片摘要/描述
    pub summary: String,
    /// 维度属性: 维度键 -> 选项原始值（缺失的维度视为通配）
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// 可搜索文本 - 标题+摘要，构建索引时统一转为小写，
    /// 查询时不再重新转换
    pub search_text: String,
    /// 发布日期（源数据缺失或无法解析时为Unix纪元）
    pub date: DateTime<Utc>,
    /// 浏览次数（源数据缺失或非数字时为0）
    #[serde(default)]
    pub views: u64,
}

impl CardMetadata {
    /// 创建卡片元数据，同时派生小写的可搜索文本
    pub fn new(
        id: String,
        title: String,
        summary: String,
        attrs: HashMap<String, String>,
        date: DateTime<Utc>,
        views: u64,
    ) -> Self {
        let search_text = format!("{} {}", title, summary).to_lowercase();
        CardMetadata {
            id,
            title,
            summary,
            attrs,
            search_text,
            date,
            views,
        }
    }
}

/// 解析日期字符串，失败时回退为Unix纪元
/// 支持RFC3339（2025-03-12T10:00:00Z）和纯日期（2025-03-12）两种格式
pub fn parse_date_or_epoch(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return epoch();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    // 纯日期按当天零点（UTC）处理
    let with_midnight = format!("{}T00:00:00Z", raw);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&with_midnight) {
        return dt.with_timezone(&Utc);
    }
    epoch()
}

/// 解析浏览次数，失败时回退为0
pub fn parse_views_or_zero(raw: &str) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(0)
}

/// Unix纪元 - 缺失日期的统一默认值
pub fn epoch() -> DateTime<Utc> {
    match Utc.timestamp_opt(0, 0) {
        chrono::LocalResult::Single(dt) => dt,
        _ => unreachable!("纪元时间戳总是有效的"),
    }
}
