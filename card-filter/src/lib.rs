use std::cmp::Ordering;

use utils_common::models::CardMetadata;
use wasm_bindgen::prelude::*;
use web_sys::console;

pub mod builder;
pub mod models;

use models::{
    FilterIndex, FilterParams, FilterState, FilterTag, RenderPlan, SortMode, WILDCARD,
};

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    "1.0.0".to_string()
}

//===== 求值 部分 =====

/// 判断卡片在当前筛选状态下是否可见（纯函数）
///
/// 所有谓词按与关系组合：每个非通配维度槽要求卡片的对应属性
/// 严格相等（卡片缺失该属性视为不匹配）；搜索词非空时额外要求
/// 可搜索文本包含该子串。搜索词与维度槽互不干涉。
pub fn card_visible(card: &CardMetadata, state: &FilterState) -> bool {
    for (key, value) in &state.slots {
        if value == WILDCARD {
            continue;
        }
        match card.attrs.get(key) {
            Some(attr) if attr == value => {}
            _ => return false,
        }
    }

    if !state.search.is_empty() && !card.search_text.contains(&state.search) {
        return false;
    }

    true
}

/// 排序比较器 - 对可排序集合按指定方式给出全序
/// 缺失日期已在索引构建时回退为纪元，缺失浏览次数回退为0
pub fn compare_cards(a: &CardMetadata, b: &CardMetadata, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Newest => b.date.cmp(&a.date),
        SortMode::Oldest => a.date.cmp(&b.date),
        SortMode::Popular => b.views.cmp(&a.views),
    }
}

/// 根据状态与索引计算渲染计划（纯函数，无副作用）
///
/// 排序作用于整个集合而不只是可见子集，之后再做可见性判定，
/// 因为顺序与可见性相互独立。使用稳定排序保证相同键的卡片
/// 保持原有相对顺序，重复排序是幂等的。
pub fn decide(index: &FilterIndex, state: &FilterState) -> RenderPlan {
    let mut ordered: Vec<&CardMetadata> = index.cards.iter().collect();
    if index.sortable {
        ordered.sort_by(|a, b| compare_cards(a, b, state.sort));
    }

    let order: Vec<String> = ordered.iter().map(|card| card.id.clone()).collect();
    let visible: Vec<String> = ordered
        .iter()
        .filter(|card| card_visible(card, state))
        .map(|card| card.id.clone())
        .collect();

    let tags = build_tags(index, state);

    RenderPlan {
        show_placeholder: visible.is_empty(),
        show_clear_all: !tags.is_empty(),
        order,
        visible,
        tags,
    }
}

/// 把筛选状态投影为标签列表，每次从头重建
/// 顺序固定为索引中的维度声明顺序，搜索词不参与
fn build_tags(index: &FilterIndex, state: &FilterState) -> Vec<FilterTag> {
    index
        .dimensions
        .iter()
        .filter_map(|dim| {
            let value = state.slots.get(&dim.key)?;
            if value == WILDCARD {
                return None;
            }
            Some(FilterTag {
                dimension: dim.key.clone(),
                label: dim.label.clone(),
                value: value.clone(),
                display_value: dim.display_label(value),
            })
        })
        .collect()
}

//===== 集合视图 部分 =====

/// 集合视图 - 一个页面集合的筛选引擎实例
///
/// 状态由实例独占，页面上的多个集合各持有自己的视图，
/// 互不共享。每次变更都返回重新计算的渲染计划。
pub struct CollectionView {
    index: FilterIndex,
    state: FilterState,
}

impl CollectionView {
    pub fn new(index: FilterIndex) -> Self {
        let state = FilterState::for_index(&index);
        CollectionView { index, state }
    }

    /// 从压缩的索引数据创建视图
    pub fn from_compressed(data: &[u8]) -> Result<Self, String> {
        let index = FilterIndex::from_compressed(data).map_err(|e| format!("解析索引失败: {}", e))?;
        Ok(CollectionView::new(index))
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn index(&self) -> &FilterIndex {
        &self.index
    }

    /// 计算当前状态下的渲染计划
    pub fn plan(&self) -> RenderPlan {
        decide(&self.index, &self.state)
    }

    /// 设置某个维度槽的值
    pub fn set_dimension(&mut self, key: &str, value: &str) -> Result<RenderPlan, String> {
        self.check_dimension(key)?;
        self.state.slots.insert(key.to_string(), value.to_string());
        Ok(self.plan())
    }

    /// 设置搜索词，内部统一去空白并转为小写
    pub fn set_search(&mut self, term: &str) -> RenderPlan {
        self.state.search = term.trim().to_lowercase();
        self.plan()
    }

    /// 设置排序方式，仅对可排序集合有效
    pub fn set_sort(&mut self, mode: &str) -> Result<RenderPlan, String> {
        if !self.index.sortable {
            return Err("该集合不支持排序".to_string());
        }
        self.state.sort = SortMode::parse(mode)?;
        Ok(self.plan())
    }

    /// 移除一个筛选标签 - 只重置对应的维度槽，其余槽保持不变
    pub fn remove_tag(&mut self, key: &str) -> Result<RenderPlan, String> {
        self.check_dimension(key)?;
        self.state.slots.insert(key.to_string(), WILDCARD.to_string());
        Ok(self.plan())
    }

    /// 清除全部筛选条件，所有槽和搜索词恢复默认
    pub fn clear_all(&mut self) -> RenderPlan {
        self.state = FilterState::for_index(&self.index);
        self.plan()
    }

    /// 批量应用筛选参数（页面初始化时恢复控件状态用）
    pub fn apply(&mut self, params: &FilterParams) -> Result<RenderPlan, String> {
        if let Some(slots) = &params.slots {
            for (key, value) in slots {
                self.check_dimension(key)?;
                self.state.slots.insert(key.clone(), value.clone());
            }
        }
        if let Some(search) = &params.search {
            self.state.search = search.trim().to_lowercase();
        }
        if let Some(sort) = &params.sort {
            if !self.index.sortable {
                return Err("该集合不支持排序".to_string());
            }
            self.state.sort = SortMode::parse(sort)?;
        }
        Ok(self.plan())
    }

    fn check_dimension(&self, key: &str) -> Result<(), String> {
        if self.index.dimensions.iter().any(|dim| dim.key == key) {
            Ok(())
        } else {
            Err(format!("未知的筛选维度: {}", key))
        }
    }
}

//===== JS接口 部分 =====

/// 集合视图JS接口 - 每个页面集合构造一个实例
#[wasm_bindgen]
pub struct CollectionViewJs {
    inner: CollectionView,
}

#[wasm_bindgen]
impl CollectionViewJs {
    /// 从压缩的索引数据初始化视图
    #[wasm_bindgen(constructor)]
    pub fn new(index_data: &[u8]) -> Result<CollectionViewJs, JsValue> {
        console_error_panic_hook::set_once();

        let inner = CollectionView::from_compressed(index_data).map_err(|e| {
            console::log_1(&JsValue::from_str(&format!("加载筛选索引失败: {}", e)));
            JsValue::from_str(&e)
        })?;

        Ok(CollectionViewJs { inner })
    }

    /// 当前状态下的渲染计划
    pub fn plan(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.plan())
    }

    /// 维度定义列表（页面渲染下拉框/按钮用）
    pub fn dimensions(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.index().dimensions)
    }

    pub fn set_dimension(&mut self, key: &str, value: &str) -> Result<JsValue, JsValue> {
        let plan = self.inner.set_dimension(key, value).map_err(js_err)?;
        to_js(&plan)
    }

    pub fn set_search(&mut self, term: &str) -> Result<JsValue, JsValue> {
        to_js(&self.inner.set_search(term))
    }

    pub fn set_sort(&mut self, mode: &str) -> Result<JsValue, JsValue> {
        let plan = self.inner.set_sort(mode).map_err(js_err)?;
        to_js(&plan)
    }

    pub fn remove_tag(&mut self, key: &str) -> Result<JsValue, JsValue> {
        let plan = self.inner.remove_tag(key).map_err(js_err)?;
        to_js(&plan)
    }

    pub fn clear_all(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.clear_all())
    }

    /// 以JSON一次性应用筛选参数
    pub fn apply(&mut self, params_json: &str) -> Result<JsValue, JsValue> {
        let params: FilterParams = serde_json::from_str(params_json)
            .map_err(|e| JsValue::from_str(&format!("解析参数失败: {}", e)))?;
        let plan = self.inner.apply(&params).map_err(js_err)?;
        to_js(&plan)
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
}

fn js_err(message: String) -> JsValue {
    console::log_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use models::{DimensionDef, INDEX_VERSION};
    use std::collections::HashMap;
    use utils_common::models::epoch;

    fn card(id: &str, title: &str, attrs: &[(&str, &str)]) -> CardMetadata {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        CardMetadata::new(
            id.to_string(),
            title.to_string(),
            String::new(),
            attrs,
            epoch(),
            0,
        )
    }

    fn dated_card(id: &str, date: &str, views: u64) -> CardMetadata {
        CardMetadata::new(
            id.to_string(),
            id.to_string(),
            String::new(),
            HashMap::new(),
            utils_common::models::parse_date_or_epoch(date),
            views,
        )
    }

    fn category_index(cards: Vec<CardMetadata>) -> FilterIndex {
        FilterIndex {
            dimensions: vec![DimensionDef {
                key: "category".to_string(),
                label: "Category".to_string(),
                options: vec![
                    ("fps".to_string(), "FPS".to_string()),
                    ("moba".to_string(), "MOBA".to_string()),
                ],
            }],
            cards,
            sortable: false,
        }
    }

    fn sample_view() -> CollectionView {
        let index = category_index(vec![
            card("alpha", "Alpha", &[("category", "fps")]),
            card("beta", "Beta", &[("category", "moba")]),
        ]);
        CollectionView::new(index)
    }

    #[test]
    fn dimension_filter_selects_matching_cards() {
        let mut view = sample_view();
        let plan = view.set_dimension("category", "fps").unwrap();
        assert_eq!(plan.visible, vec!["alpha"]);
        assert!(!plan.show_placeholder);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut view = sample_view();
        let plan = view.set_search("BET");
        assert_eq!(plan.visible, vec!["beta"]);
    }

    #[test]
    fn search_and_dimension_are_anded() {
        let mut view = sample_view();
        view.set_dimension("category", "fps").unwrap();
        let plan = view.set_search("beta");
        assert!(plan.visible.is_empty());
        assert!(plan.show_placeholder);
    }

    #[test]
    fn missing_attribute_never_matches_non_wildcard() {
        let index = category_index(vec![card("bare", "Bare", &[])]);
        let mut view = CollectionView::new(index);
        let plan = view.set_dimension("category", "fps").unwrap();
        assert!(plan.visible.is_empty());
        let plan = view.remove_tag("category").unwrap();
        assert_eq!(plan.visible, vec!["bare"]);
    }

    #[test]
    fn clear_all_restores_full_collection() {
        let mut view = sample_view();
        view.set_dimension("category", "fps").unwrap();
        view.set_search("a");
        let plan = view.clear_all();
        assert_eq!(plan.visible, vec!["alpha", "beta"]);
        assert!(plan.tags.is_empty());
        assert!(!plan.show_clear_all);
        assert!(view.state().search.is_empty());
    }

    #[test]
    fn same_state_yields_same_plan() {
        let mut view = sample_view();
        let first = view.set_dimension("category", "moba").unwrap();
        let second = view.set_dimension("category", "moba").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tags_reflect_non_default_slots_with_display_labels() {
        let mut view = sample_view();
        let plan = view.set_dimension("category", "fps").unwrap();
        assert_eq!(plan.tags.len(), 1);
        assert_eq!(plan.tags[0].label, "Category");
        assert_eq!(plan.tags[0].display_value, "FPS");
        assert!(plan.show_clear_all);

        let plan = view.remove_tag("category").unwrap();
        assert!(plan.tags.is_empty());
        assert!(!plan.show_clear_all);
    }

    #[test]
    fn unknown_dimension_is_an_error() {
        let mut view = sample_view();
        assert!(view.set_dimension("platform", "pc").is_err());
        assert!(view.remove_tag("platform").is_err());
    }

    #[test]
    fn sort_on_unsortable_collection_is_an_error() {
        let mut view = sample_view();
        assert!(view.set_sort("newest").is_err());
    }

    fn sortable_index() -> FilterIndex {
        FilterIndex {
            dimensions: Vec::new(),
            cards: vec![
                dated_card("old", "2024-01-10", 900),
                dated_card("mid-a", "2025-02-01", 300),
                dated_card("mid-b", "2025-02-01", 500),
                dated_card("new", "2025-06-15", 100),
            ],
            sortable: true,
        }
    }

    #[test]
    fn newest_and_oldest_reverse_distinct_dates() {
        let mut view = CollectionView::new(sortable_index());
        let newest = view.set_sort("newest").unwrap();
        let oldest = view.set_sort("oldest").unwrap();

        let distinct_newest: Vec<&String> = newest
            .order
            .iter()
            .filter(|id| !id.starts_with("mid"))
            .collect();
        let mut distinct_oldest: Vec<&String> = oldest
            .order
            .iter()
            .filter(|id| !id.starts_with("mid"))
            .collect();
        distinct_oldest.reverse();
        assert_eq!(distinct_newest, distinct_oldest);
    }

    #[test]
    fn equal_dates_keep_original_relative_order() {
        let mut view = CollectionView::new(sortable_index());
        let plan = view.set_sort("newest").unwrap();
        let pos_a = plan.order.iter().position(|id| id == "mid-a").unwrap();
        let pos_b = plan.order.iter().position(|id| id == "mid-b").unwrap();
        assert!(pos_a < pos_b);

        // 重复排序保持幂等
        let again = view.set_sort("newest").unwrap();
        assert_eq!(plan.order, again.order);
    }

    #[test]
    fn popular_sorts_by_views_descending() {
        let mut view = CollectionView::new(sortable_index());
        let plan = view.set_sort("popular").unwrap();
        assert_eq!(plan.order[0], "old");
        assert_eq!(plan.order[3], "new");
    }

    #[test]
    fn missing_date_sorts_as_epoch() {
        let index = FilterIndex {
            dimensions: Vec::new(),
            cards: vec![
                dated_card("undated", "garbage", 0),
                dated_card("dated", "2025-01-01", 0),
            ],
            sortable: true,
        };
        let mut view = CollectionView::new(index);
        let plan = view.set_sort("oldest").unwrap();
        assert_eq!(plan.order, vec!["undated", "dated"]);
        assert_eq!(
            view.index().cards[0].date,
            Utc.timestamp_opt(0, 0).unwrap()
        );
    }

    #[test]
    fn sorting_does_not_change_visibility() {
        let mut cards = sortable_index().cards;
        for card in &mut cards {
            card.attrs
                .insert("category".to_string(), "fps".to_string());
        }
        let index = FilterIndex {
            dimensions: category_index(Vec::new()).dimensions,
            cards,
            sortable: true,
        };
        let mut view = CollectionView::new(index);
        view.set_dimension("category", "fps").unwrap();
        let plan = view.set_sort("oldest").unwrap();
        assert_eq!(plan.visible.len(), 4);
        assert_eq!(plan.visible, plan.order);
    }

    #[test]
    fn placeholder_appears_exactly_when_nothing_visible() {
        let mut view = sample_view();
        let plan = view.set_search("zzz");
        assert!(plan.show_placeholder);
        let plan = view.set_search("");
        assert!(!plan.show_placeholder);
        assert_eq!(plan.visible.len(), 2);
    }

    #[test]
    fn apply_sets_multiple_constraints_at_once() {
        let mut view = sample_view();
        let params: FilterParams =
            serde_json::from_str(r#"{"slots":{"category":"moba"},"search":"  BeTa "}"#).unwrap();
        let plan = view.apply(&params).unwrap();
        assert_eq!(plan.visible, vec!["beta"]);
        assert_eq!(view.state().search, "beta");
    }

    #[test]
    fn index_round_trips_through_compression() {
        let index = category_index(vec![card("alpha", "Alpha", &[("category", "fps")])]);
        let data = utils_common::to_compressed(&index, INDEX_VERSION).unwrap();
        let view = CollectionView::from_compressed(&data).unwrap();
        assert_eq!(view.plan().visible, vec!["alpha"]);
    }
}
