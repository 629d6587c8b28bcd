//! 目录提取模块
//!
//! 按文档顺序收集标题节点，生成带锚点的目录条目。

use crate::kdp::model::ContentNode;
use std::collections::HashSet;

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 标题文本
    pub title: String,
    /// 标题级别（1-6）
    pub level: u8,
    /// 锚点ID
    pub anchor_id: String,
}

/// 目录提取器
pub struct TocExtractor;

impl TocExtractor {
    /// 生成锚点ID使用的前缀
    pub const ANCHOR_PREFIX: &'static str = "heading_";

    /// 提取目录
    ///
    /// 没有id的标题会被分配 `heading_<n>`，n是它在本次调用中没有id的标题里的
    /// 发现顺序（从0开始），并写回节点。已有id的标题不会被重新编号，因此对
    /// 同一棵树重复调用得到相同的结果。
    ///
    /// 标题的显式id如果已被文档中更靠前的节点使用，会改为追加 `_<k>` 后缀
    /// 的新id，保证锚点在文档内唯一。
    ///
    /// # 参数
    /// * `root` - 规范化后的内容树
    ///
    /// # 返回值
    /// * `Vec<TocEntry>` - 按文档顺序排列的目录条目
    pub fn extract(root: &mut ContentNode) -> Vec<TocEntry> {
        let mut taken = collect_ids(root);

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut generated = 0usize;

        root.walk_mut(&mut |node| {
            let Some(level) = node.heading_level() else {
                if let Some(id) = node.id() {
                    seen.insert(id.to_string());
                }
                return;
            };

            let anchor_id = match node.id() {
                Some(id) if seen.contains(id) => {
                    let renamed = unique_id(id, &taken);
                    log::warn!("标题锚点ID重复: {}，改为 {}", id, renamed);
                    renamed
                }
                Some(id) => id.to_string(),
                None => {
                    let id = unique_id(&format!("{}{}", Self::ANCHOR_PREFIX, generated), &taken);
                    generated += 1;
                    id
                }
            };
            if node.id() != Some(anchor_id.as_str()) {
                node.set_id(&anchor_id);
            }
            taken.insert(anchor_id.clone());
            seen.insert(anchor_id.clone());

            entries.push(TocEntry {
                title: Self::heading_title(node),
                level,
                anchor_id,
            });
        });

        log::debug!("提取到 {} 个目录条目，新分配 {} 个锚点", entries.len(), generated);
        entries
    }

    /// 标题文本，连续空白压缩为单个空格
    pub fn heading_title(node: &ContentNode) -> String {
        node.text_content()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 以 `base` 为基础生成不在 `taken` 中的id，冲突时追加 `_<k>` 后缀
pub(crate) fn unique_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|k| format!("{}_{}", base, k))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// 收集树中已经使用的全部id
pub(crate) fn collect_ids(root: &ContentNode) -> HashSet<String> {
    let mut ids = HashSet::new();
    root.walk(&mut |node| {
        if let Some(id) = node.id() {
            ids.insert(id.to_string());
        }
    });
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::model::parse_markup;

    #[test]
    fn test_extract_scenario() {
        let mut root = parse_markup("<h1>Intro</h1><p>Hello</p><h1>End</h1><p>Bye</p>").unwrap();
        let toc = TocExtractor::extract(&mut root);

        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "Intro");
        assert_eq!(toc[0].level, 1);
        assert_eq!(toc[0].anchor_id, "heading_0");
        assert_eq!(toc[1].title, "End");
        assert_eq!(toc[1].level, 1);
        assert_eq!(toc[1].anchor_id, "heading_1");
        assert_eq!(root.children[0].id(), Some("heading_0"));
    }

    #[test]
    fn test_existing_ids_are_kept_and_not_counted() {
        let mut root =
            parse_markup("<h1 id=\"start\">A</h1><h2>B</h2><div><h3>C</h3></div><h2 id=\"end\">D</h2>").unwrap();
        let toc = TocExtractor::extract(&mut root);

        let ids: Vec<&str> = toc.iter().map(|e| e.anchor_id.as_str()).collect();
        assert_eq!(ids, vec!["start", "heading_0", "heading_1", "end"]);
        let levels: Vec<u8> = toc.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_extract_is_stable() {
        let mut root = parse_markup("<h1>A</h1><h2>B</h2><h2>C</h2>").unwrap();
        let first = TocExtractor::extract(&mut root);
        let second = TocExtractor::extract(&mut root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_band_id_does_not_renumber() {
        let mut root = parse_markup("<h1>A</h1><h2>B</h2>").unwrap();
        TocExtractor::extract(&mut root);

        root.children[0].set_id("custom");
        let toc = TocExtractor::extract(&mut root);
        assert_eq!(toc[0].anchor_id, "custom");
        assert_eq!(toc[1].anchor_id, "heading_1");
    }

    #[test]
    fn test_generated_id_avoids_collision() {
        let mut root = parse_markup("<p id=\"heading_0\">x</p><h1>A</h1>").unwrap();
        let toc = TocExtractor::extract(&mut root);
        assert_eq!(toc[0].anchor_id, "heading_0_1");
    }

    #[test]
    fn test_duplicate_heading_ids_made_unique() {
        let mut root = parse_markup("<h1 id=\"x\">A</h1><p>a</p><h1 id=\"x\">B</h1><h2 id=\"x_1\">C</h2>").unwrap();
        let toc = TocExtractor::extract(&mut root);

        let ids: Vec<&str> = toc.iter().map(|e| e.anchor_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "x_2", "x_1"]);
        assert_eq!(root.children[2].id(), Some("x_2"));
        assert_eq!(TocExtractor::extract(&mut root), toc);
    }

    #[test]
    fn test_heading_reusing_paragraph_id() {
        let mut root = parse_markup("<p id=\"intro\">x</p><h1 id=\"intro\">A</h1>").unwrap();
        let toc = TocExtractor::extract(&mut root);
        assert_eq!(toc[0].anchor_id, "intro_1");
    }

    #[test]
    fn test_unique_id_suffixes() {
        let taken: HashSet<String> = ["a", "a_1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_id("a", &taken), "a_2");
        assert_eq!(unique_id("b", &taken), "b");
    }

    #[test]
    fn test_title_whitespace_collapsed() {
        let mut root = parse_markup("<h2>  Part\n   <em>One</em> </h2>").unwrap();
        let toc = TocExtractor::extract(&mut root);
        assert_eq!(toc[0].title, "Part One");
    }

    #[test]
    fn test_no_headings() {
        let mut root = parse_markup("<p>only text</p>").unwrap();
        assert!(TocExtractor::extract(&mut root).is_empty());
    }
}
