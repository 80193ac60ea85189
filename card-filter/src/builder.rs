use std::fs::File;
use std::io::Write;

use utils_common::compression::to_compressed;
use utils_common::models::CardMetadata;

use crate::models::{DimensionDef, FilterIndex, INDEX_VERSION};

/// 筛选索引构建器 - 由索引生成工具按集合填充
pub struct FilterBuilder {
    dimensions: Vec<DimensionDef>,
    cards: Vec<CardMetadata>,
    sortable: bool,
}

impl FilterBuilder {
    pub fn new() -> Self {
        FilterBuilder {
            dimensions: Vec::new(),
            cards: Vec::new(),
            sortable: false,
        }
    }

    /// 标记该集合支持排序（新闻集合）
    pub fn set_sortable(&mut self, sortable: bool) {
        self.sortable = sortable;
    }

    /// 登记一个筛选维度；重复的维度键只保留首次登记的定义
    pub fn add_dimension(&mut self, def: DimensionDef) {
        if self.dimensions.iter().any(|d| d.key == def.key) {
            return;
        }
        self.dimensions.push(def);
    }

    /// 添加卡片到构建器
    pub fn add_card(&mut self, card: CardMetadata) {
        self.cards.push(card);
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// 构建筛选索引
    pub fn build_filter_index(&self) -> Result<FilterIndex, String> {
        if self.cards.is_empty() {
            return Err("无法构建索引: 没有卡片数据".to_string());
        }

        Ok(FilterIndex {
            dimensions: self.dimensions.clone(),
            cards: self.cards.clone(),
            sortable: self.sortable,
        })
    }

    /// 构建并保存压缩后的筛选索引到文件
    pub fn save_filter_index(&self, path: &str) -> Result<(), String> {
        let index = self.build_filter_index()?;

        let compressed = to_compressed(&index, INDEX_VERSION)
            .map_err(|e| format!("压缩筛选索引失败: {}", e))?;

        let mut file =
            File::create(path).map_err(|e| format!("无法创建索引文件 {}: {}", path, e))?;
        file.write_all(&compressed)
            .map_err(|e| format!("无法写入索引文件 {}: {}", path, e))?;

        println!(
            "筛选索引已写入: {}，卡片 {} 张，维度 {} 个，大小 {} 字节",
            path,
            index.cards.len(),
            index.dimensions.len(),
            compressed.len()
        );

        Ok(())
    }
}

impl Default for FilterBuilder {
    fn default() -> Self {
        FilterBuilder::new()
    }
}
