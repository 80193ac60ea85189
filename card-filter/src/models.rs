use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utils_common::models::CardMetadata;

/// 通配值 - 表示某个维度不施加任何约束
pub const WILDCARD: &str = "all";

/// 索引文件版本号
pub const INDEX_VERSION: [u8; 2] = [1, 0];

/// 筛选维度定义 - 一个分类轴（game、format、entry、status、category）
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DimensionDef {
    /// 维度键，对应卡片的data-*属性名
    pub key: String,
    /// 维度显示名称（如 Game、Entry Fee）
    pub label: String,
    /// 选项列表: (原始值, 显示文本)，来自页面筛选控件
    pub options: Vec<(String, String)>,
}

impl DimensionDef {
    /// 查找选项的显示文本，未登记的选项回退为原始值
    pub fn display_label(&self, value: &str) -> String {
        self.options
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| value.to_string())
    }
}

/// 筛选索引 - 一个集合的全部卡片与维度定义
/// 维度顺序即标签的固定显示顺序
#[derive(Serialize, Deserialize, Debug)]
pub struct FilterIndex {
    pub dimensions: Vec<DimensionDef>,
    pub cards: Vec<CardMetadata>,
    /// 该集合是否支持排序（目前只有新闻集合）
    pub sortable: bool,
}

impl FilterIndex {
    /// 从压缩的二进制数据恢复索引
    pub fn from_compressed(data: &[u8]) -> Result<Self, std::io::Error> {
        utils_common::compression::from_compressed_with_max_version(data, INDEX_VERSION[0])
    }
}

/// 排序方式
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// 按日期降序
    Newest,
    /// 按日期升序
    Oldest,
    /// 按浏览次数降序
    Popular,
}

impl SortMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "popular" => Ok(SortMode::Popular),
            _ => Err(format!("未知的排序方式: {}", raw)),
        }
    }
}

/// 筛选状态 - 当前用户选择的全部约束，单一事实来源
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterState {
    /// 维度槽: 维度键 -> 当前选中值，默认为通配值"all"
    pub slots: HashMap<String, String>,
    /// 搜索词，存入前统一去空白并转为小写
    pub search: String,
    /// 排序方式（仅对可排序集合生效）
    pub sort: SortMode,
}

impl FilterState {
    /// 按索引的维度定义创建全默认状态
    pub fn for_index(index: &FilterIndex) -> Self {
        let slots = index
            .dimensions
            .iter()
            .map(|dim| (dim.key.clone(), WILDCARD.to_string()))
            .collect();
        FilterState {
            slots,
            search: String::new(),
            sort: SortMode::Newest,
        }
    }
}

/// 批量状态参数 - 页面脚本以JSON一次性传入的筛选条件
#[derive(Deserialize, Debug, Default)]
pub struct FilterParams {
    /// 维度选择（可选，缺省的维度保持当前值）
    pub slots: Option<HashMap<String, String>>,
    /// 搜索词（可选）
    pub search: Option<String>,
    /// 排序方式: "newest", "oldest", "popular"（可选）
    pub sort: Option<String>,
}

/// 筛选标签 - 非默认维度槽的可移除投影，搜索词不生成标签
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterTag {
    /// 所属维度键，移除标签时用于精确重置该槽
    pub dimension: String,
    /// 维度显示名称
    pub label: String,
    /// 槽的原始值
    pub value: String,
    /// 选项显示文本
    pub display_value: String,
}

/// 渲染计划 - 纯决策结果，由页面脚本应用到DOM
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct RenderPlan {
    /// 排序后的完整卡片顺序（可见性与顺序相互独立）
    pub order: Vec<String>,
    /// 按顺序排列的可见卡片ID
    pub visible: Vec<String>,
    /// 可见数量为0时显示唯一的空状态占位，恢复后必须移除
    pub show_placeholder: bool,
    /// 按维度声明顺序排列的筛选标签
    pub tags: Vec<FilterTag>,
    /// 至少存在一个标签时才显示"清除全部"控件
    pub show_clear_all: bool,
}
