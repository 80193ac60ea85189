use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use clap::{Arg, ArgAction, Command};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use walkdir::WalkDir;

use card_filter::builder::FilterBuilder;
use card_filter::models::{DimensionDef, WILDCARD};
use utils_common::models::{parse_date_or_epoch, parse_views_or_zero, CardMetadata};

/// 集合规格 - 一种卡片集合在页面上的约定
struct CollectionSpec {
    /// 集合名，用作输出文件名
    name: &'static str,
    /// 卡片节点的class
    card_class: &'static str,
    /// 维度列表: (data-*属性键, 默认显示名称)，顺序即标签显示顺序
    dimensions: &'static [(&'static str, &'static str)],
    /// 是否支持排序
    sortable: bool,
}

/// 站点上已知的三种卡片集合
const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: "tournaments",
        card_class: "tournament-card",
        dimensions: &[
            ("game", "Game"),
            ("format", "Format"),
            ("entry", "Entry Fee"),
            ("status", "Status"),
        ],
        sortable: false,
    },
    CollectionSpec {
        name: "news",
        card_class: "news-item",
        dimensions: &[("category", "Category")],
        sortable: true,
    },
    CollectionSpec {
        name: "games",
        card_class: "game-card",
        dimensions: &[("category", "Category")],
        sortable: false,
    },
];

// 主函数
fn main() {
    // 设置命令行参数
    let matches = Command::new("卡片索引生成器")
        .version(env!("CARGO_PKG_VERSION"))
        .about("从站点HTML页面提取卡片数据，生成筛选索引")
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("SITE_DIR")
                .help("站点HTML根目录")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("索引输出目录")
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("显示详细信息")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let source_dir = matches.get_one::<String>("source").expect("必填参数");
    let output_dir = matches.get_one::<String>("output").expect("必填参数");
    let verbose = matches.get_flag("verbose");

    let source_path = Path::new(source_dir);
    if !source_path.exists() || !source_path.is_dir() {
        eprintln!("错误: 源目录不存在或不是有效目录 '{}'", source_dir);
        std::process::exit(1);
    }

    let output_path = Path::new(output_dir);
    if !output_path.exists() {
        if let Err(e) = fs::create_dir_all(output_path) {
            eprintln!("错误: 无法创建输出目录 '{}': {}", output_dir, e);
            std::process::exit(1);
        }
    }

    println!("开始生成索引...");
    println!("源目录: {}", source_dir);
    println!("输出目录: {}", output_dir);

    match generate_indices(source_dir, output_dir, verbose) {
        Ok(_) => println!("索引生成成功！"),
        Err(e) => {
            eprintln!("错误: 索引生成失败: {}", e);
            std::process::exit(1);
        }
    }
}

/// 集合累加器 - 在整个站点扫描期间聚合一种集合的数据
struct CollectionAccumulator {
    spec: &'static CollectionSpec,
    builder: FilterBuilder,
    /// 从页面筛选控件采集的选项: 维度键 -> (原始值, 显示文本)
    harvested: HashMap<String, Vec<(String, String)>>,
    /// 卡片上实际出现过的属性值，控件缺失时的兜底来源
    observed: BTreeMap<String, BTreeSet<String>>,
}

impl CollectionAccumulator {
    fn new(spec: &'static CollectionSpec) -> Self {
        let mut builder = FilterBuilder::new();
        builder.set_sortable(spec.sortable);
        CollectionAccumulator {
            spec,
            builder,
            harvested: HashMap::new(),
            observed: BTreeMap::new(),
        }
    }

    /// 扫描结束后登记维度定义（控件选项优先，卡片属性值兜底）
    fn finish_dimensions(&mut self) {
        for (key, label) in self.spec.dimensions {
            let options = match self.harvested.get(*key) {
                Some(options) if !options.is_empty() => options.clone(),
                _ => self
                    .observed
                    .get(*key)
                    .map(|values| {
                        values
                            .iter()
                            .map(|v| (v.clone(), title_case(v)))
                            .collect()
                    })
                    .unwrap_or_default(),
            };
            self.builder.add_dimension(DimensionDef {
                key: (*key).to_string(),
                label: (*label).to_string(),
                options,
            });
        }
    }
}

// 生成索引的主流程
fn generate_indices(source_dir: &str, output_dir: &str, verbose: bool) -> Result<(), String> {
    let start_time = std::time::Instant::now();

    println!("扫描HTML文件...");
    let mut accumulators = scan_site(source_dir, verbose)?;

    let total_cards: usize = accumulators.iter().map(|acc| acc.builder.card_count()).sum();
    if total_cards == 0 {
        return Err("没有找到任何卡片".to_string());
    }

    println!("正在生成和保存索引...");
    for acc in &mut accumulators {
        if acc.builder.card_count() == 0 {
            if verbose {
                println!("集合 {} 没有卡片，跳过", acc.spec.name);
            }
            continue;
        }
        acc.finish_dimensions();
        let path = format!("{}/{}_index.bin", output_dir, acc.spec.name);
        acc.builder.save_filter_index(&path)?;
    }

    let elapsed = start_time.elapsed();
    println!("索引生成完成！耗时: {:.2}秒", elapsed.as_secs_f32());

    Ok(())
}

// 扫描站点目录，按集合聚合卡片与筛选控件选项
fn scan_site(dir_path: &str, verbose: bool) -> Result<Vec<CollectionAccumulator>, String> {
    let base_dir = Path::new(dir_path);
    let mut accumulators: Vec<CollectionAccumulator> =
        COLLECTIONS.iter().map(CollectionAccumulator::new).collect();
    let mut html_files = 0;

    for entry in WalkDir::new(base_dir) {
        let entry = entry.map_err(|e| format!("遍历目录时出错: {}", e))?;

        if !entry.file_type().is_file()
            || !entry.path().extension().map_or(false, |ext| ext == "html")
        {
            continue;
        }
        html_files += 1;

        match index_page(entry.path(), base_dir, &mut accumulators) {
            Ok(found) => {
                if verbose && found > 0 {
                    println!("{}: 提取卡片 {} 张", entry.path().display(), found);
                }
            }
            Err(err) => {
                // 单个页面解析失败只跳过该页面，不中断整体扫描
                if verbose {
                    eprintln!("解析文件时出错 {}: {}", entry.path().display(), err);
                }
            }
        }
    }

    if verbose {
        let per_collection: Vec<String> = accumulators
            .iter()
            .map(|acc| format!("{}: {}", acc.spec.name, acc.builder.card_count()))
            .collect();
        println!(
            "扫描完成。HTML文件 {} 个，卡片数量 [{}]",
            html_files,
            per_collection.join(", ")
        );
    }

    Ok(accumulators)
}

// 解析单个页面并把提取到的数据写入各集合累加器，返回卡片数
fn index_page(
    file_path: &Path,
    base_dir: &Path,
    accumulators: &mut [CollectionAccumulator],
) -> Result<usize, String> {
    let html = fs::read_to_string(file_path)
        .map_err(|e| format!("无法读取文件 {}: {}", file_path.display(), e))?;

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| format!("解析HTML时出错: {}", e))?;

    let page_stem = page_stem(file_path, base_dir);
    let mut found = 0;

    for acc in accumulators.iter_mut() {
        let cards = extract_cards(&dom.document, acc.spec, &page_stem);
        for card in cards {
            for (key, value) in &card.attrs {
                acc.observed
                    .entry(key.clone())
                    .or_default()
                    .insert(value.clone());
            }
            acc.builder.add_card(card);
            found += 1;
        }

        for (key, _) in acc.spec.dimensions {
            if acc.harvested.get(*key).map_or(true, |o| o.is_empty()) {
                let options = extract_dimension_options(&dom.document, key);
                if !options.is_empty() {
                    acc.harvested.insert((*key).to_string(), options);
                }
            }
        }
    }

    Ok(found)
}

// 计算页面的相对路径词干，用于派生卡片ID
fn page_stem(file_path: &Path, base_dir: &Path) -> String {
    file_path
        .strip_prefix(base_dir)
        .unwrap_or(file_path)
        .with_extension("")
        .to_string_lossy()
        .replace(['/', '\\'], "-")
}

// 从页面提取一种集合的全部卡片
fn extract_cards(document: &Handle, spec: &CollectionSpec, page_stem: &str) -> Vec<CardMetadata> {
    let mut nodes = Vec::new();
    collect_nodes(document, &|node| has_class(node, spec.card_class), &mut nodes);

    let mut cards = Vec::new();
    for (position, node) in nodes.iter().enumerate() {
        // 标题缺失的节点不是有效卡片
        let title = find_first_text(node, &["h3", "h2"]);
        if title.is_empty() {
            continue;
        }

        let summary = find_first_text(node, &["p"]);

        let mut attrs = HashMap::new();
        for (key, _) in spec.dimensions {
            if let Some(value) = get_attr(node, &format!("data-{}", key)) {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    attrs.insert((*key).to_string(), value);
                }
            }
        }

        let id = get_attr(node, "id")
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("{}-{}-{}", page_stem, spec.card_class, position));

        let date = parse_date_or_epoch(&get_attr(node, "data-date").unwrap_or_default());
        let views = parse_views_or_zero(&get_attr(node, "data-views").unwrap_or_default());

        cards.push(CardMetadata::new(id, title, summary, attrs, date, views));
    }

    cards
}

// 从页面筛选控件提取一个维度的选项显示文本
// 下拉框（id为"<维度>-filter"的select）优先，其次是筛选按钮
fn extract_dimension_options(document: &Handle, key: &str) -> Vec<(String, String)> {
    let select_id = format!("{}-filter", key);
    if let Some(select) = find_node(document, &|node| {
        element_name(node).as_deref() == Some("select")
            && get_attr(node, "id").as_deref() == Some(select_id.as_str())
    }) {
        return extract_select_options(&select);
    }

    // 按钮式筛选（游戏页）: .filter-btn的data-filter属性 + 按钮文本
    let mut buttons = Vec::new();
    collect_nodes(
        document,
        &|node| has_class(node, "filter-btn") && get_attr(node, "data-filter").is_some(),
        &mut buttons,
    );

    buttons
        .iter()
        .filter_map(|button| {
            let value = get_attr(button, "data-filter")?.trim().to_string();
            if value.is_empty() || value == WILDCARD {
                return None;
            }
            Some((value, text_content(button).trim().to_string()))
        })
        .collect()
}

// 收集select下的option: (value属性, 文本)，通配项除外
fn extract_select_options(select: &Handle) -> Vec<(String, String)> {
    let mut options = Vec::new();
    collect_nodes(
        select,
        &|node| element_name(node).as_deref() == Some("option"),
        &mut options,
    );

    options
        .iter()
        .filter_map(|option| {
            let value = get_attr(option, "value")?.trim().to_string();
            if value.is_empty() || value == WILDCARD {
                return None;
            }
            Some((value, text_content(option).trim().to_string()))
        })
        .collect()
}

// 把属性原始值转为显示文本（控件缺失时的兜底）
fn title_case(value: &str) -> String {
    value
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

//===== DOM遍历辅助 部分 =====

fn element_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn get_attr(handle: &Handle, attr_name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

fn has_class(handle: &Handle, class: &str) -> bool {
    get_attr(handle, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

// 深度优先收集满足条件的节点
fn collect_nodes(handle: &Handle, pred: &dyn Fn(&Handle) -> bool, out: &mut Vec<Handle>) {
    if pred(handle) {
        out.push(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        collect_nodes(child, pred, out);
    }
}

// 深度优先查找第一个满足条件的节点
fn find_node(handle: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(handle) {
        return Some(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_node(child, pred) {
            return Some(found);
        }
    }
    None
}

// 按标签优先级查找第一个后代元素的文本
fn find_first_text(handle: &Handle, tags: &[&str]) -> String {
    for tag in tags {
        if let Some(node) = find_node(handle, &|n| element_name(n).as_deref() == Some(*tag)) {
            let text = text_content(&node).trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

// 拼接节点下的全部文本内容
fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    append_text(handle, &mut out);
    out
}

fn append_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        append_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Handle {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .expect("解析测试HTML失败")
            .document
    }

    const TOURNAMENT_PAGE: &str = r#"
        <html><body>
          <select class="filter-select" id="game-filter">
            <option value="all">All Games</option>
            <option value="valorant">Valorant</option>
            <option value="lol">League of Legends</option>
          </select>
          <div class="tournament-card" id="spring-cup" data-game="valorant"
               data-format="5v5" data-entry="free" data-status="open"
               data-date="2025-04-01">
            <h3>Spring Cup</h3>
            <div class="tournament-description"><p>Open qualifier for everyone.</p></div>
          </div>
          <div class="tournament-card" data-game="lol" data-views="not-a-number">
            <h3>Summer Clash</h3>
          </div>
          <div class="tournament-card" data-game="cs2"><span>no heading</span></div>
        </body></html>
    "#;

    #[test]
    fn extracts_cards_with_attributes_and_defaults() {
        let document = parse(TOURNAMENT_PAGE);
        let cards = extract_cards(&document, &COLLECTIONS[0], "tournaments");

        assert_eq!(cards.len(), 2); // 没有标题的节点被跳过

        let spring = &cards[0];
        assert_eq!(spring.id, "spring-cup");
        assert_eq!(spring.title, "Spring Cup");
        assert_eq!(spring.summary, "Open qualifier for everyone.");
        assert_eq!(spring.attrs.get("game").map(String::as_str), Some("valorant"));
        assert_eq!(spring.attrs.get("status").map(String::as_str), Some("open"));
        assert_eq!(spring.date.to_rfc3339(), "2025-04-01T00:00:00+00:00");

        let summer = &cards[1];
        // 没有显式id时从页面词干和位置派生
        assert_eq!(summer.id, "tournaments-tournament-card-1");
        // 非数字的浏览次数回退为0，缺失日期回退为纪元
        assert_eq!(summer.views, 0);
        assert_eq!(summer.date, utils_common::models::epoch());
    }

    #[test]
    fn harvests_select_options_without_wildcard() {
        let document = parse(TOURNAMENT_PAGE);
        let options = extract_dimension_options(&document, "game");
        assert_eq!(
            options,
            vec![
                ("valorant".to_string(), "Valorant".to_string()),
                ("lol".to_string(), "League of Legends".to_string()),
            ]
        );
    }

    #[test]
    fn harvests_filter_buttons_when_no_select_exists() {
        let document = parse(
            r#"<html><body>
                 <button class="filter-btn" data-filter="all">All</button>
                 <button class="filter-btn" data-filter="fps">FPS Games</button>
               </body></html>"#,
        );
        let options = extract_dimension_options(&document, "category");
        assert_eq!(options, vec![("fps".to_string(), "FPS Games".to_string())]);
    }

    #[test]
    fn title_case_fallback_labels() {
        assert_eq!(title_case("battle-royale"), "Battle Royale");
        assert_eq!(title_case("fps"), "Fps");
    }

    #[test]
    fn page_stem_strips_base_and_extension() {
        let stem = page_stem(Path::new("/site/pages/news.html"), Path::new("/site"));
        assert_eq!(stem, "pages-news");
    }
}
