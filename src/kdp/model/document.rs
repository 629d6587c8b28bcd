//! 文档模块
//!
//! 一次流水线运行所处理的文档：内容树加元数据。

use crate::kdp::model::node::ContentNode;
use std::collections::{BTreeMap, HashMap};

/// 文档内容的来源形态，决定分章方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// 来源本身带有标题节点
    Structured,
    /// 来源只有平铺的纯文本块，标题由启发式规则推断
    Heuristic,
}

/// 文档元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// 书名
    pub title: Option<String>,
    /// 作者
    pub author: Option<String>,
    /// 语言
    pub language: Option<String>,
    /// 其他未识别的键值
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从键值映射构造元数据
    ///
    /// 识别 `title`、`author`（或 `creator`）、`language`，空值视为缺失，其余键放入 `extra`。
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut metadata = Self::new();
        for (key, value) in map {
            metadata.set(&key, value);
        }
        metadata
    }

    /// 设置单个元数据项
    pub fn set(&mut self, key: &str, value: String) {
        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }
        match key.to_ascii_lowercase().as_str() {
            "title" => self.title = Some(value),
            "author" | "creator" => self.author = Some(value),
            "language" | "lang" => self.language = Some(value),
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.set("title", title.into());
        self
    }

    pub fn with_author<S: Into<String>>(mut self, author: S) -> Self {
        self.set("author", author.into());
        self
    }

    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.set("language", language.into());
        self
    }

    /// 按优先级解析书名：显式传入的标题、元数据中的标题、默认标题
    pub fn resolve_title(&self, explicit: Option<&str>, default_title: &str) -> String {
        explicit
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.title.as_deref())
            .unwrap_or(default_title)
            .to_string()
    }

    /// 解析语言，未设置时使用默认语言
    pub fn resolve_language(&self, default_language: &str) -> String {
        self.language
            .clone()
            .unwrap_or_else(|| default_language.to_string())
    }
}

/// 一次流水线运行中的文档
#[derive(Debug, Clone)]
pub struct Document {
    /// 内容树的根节点，其直接子节点是分章的单位
    pub root: ContentNode,
    /// 元数据
    pub metadata: Metadata,
    /// 内容的来源形态
    pub mode: SegmentMode,
}

impl Document {
    pub fn new(root: ContentNode, metadata: Metadata, mode: SegmentMode) -> Self {
        Self {
            root,
            metadata,
            mode,
        }
    }

    /// 文档的顶层节点
    pub fn blocks(&self) -> &[ContentNode] {
        &self.root.children
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// 按文档顺序收集所有标题节点
    pub fn headings(&self) -> Vec<&ContentNode> {
        let mut headings = Vec::new();
        self.root.walk(&mut |node| {
            if node.is_heading() {
                headings.push(node);
            }
        });
        headings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_map() {
        let mut map = HashMap::new();
        map.insert("title".to_string(), "  My Book ".to_string());
        map.insert("creator".to_string(), "Jane".to_string());
        map.insert("language".to_string(), "".to_string());
        map.insert("publisher".to_string(), "Acme".to_string());

        let metadata = Metadata::from_map(map);
        assert_eq!(metadata.title.as_deref(), Some("My Book"));
        assert_eq!(metadata.author.as_deref(), Some("Jane"));
        assert_eq!(metadata.language, None);
        assert_eq!(metadata.extra.get("publisher").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn test_resolve_title_order() {
        let metadata = Metadata::new().with_title("From Source");
        assert_eq!(metadata.resolve_title(Some("Explicit"), "Untitled"), "Explicit");
        assert_eq!(metadata.resolve_title(Some("  "), "Untitled"), "From Source");
        assert_eq!(metadata.resolve_title(None, "Untitled"), "From Source");
        assert_eq!(Metadata::new().resolve_title(None, "Untitled"), "Untitled");
    }

    #[test]
    fn test_resolve_language_default() {
        assert_eq!(Metadata::new().resolve_language("en"), "en");
        assert_eq!(Metadata::new().with_language("fr").resolve_language("en"), "fr");
    }

    #[test]
    fn test_headings_in_document_order() {
        let root = ContentNode::root()
            .with_child(ContentNode::heading(1, "A"))
            .with_child(
                ContentNode::new(crate::kdp::model::node::NodeKind::GenericElement(
                    "section".to_string(),
                ))
                .with_child(ContentNode::heading(3, "B")),
            )
            .with_child(ContentNode::heading(2, "C"));
        let document = Document::new(root, Metadata::new(), SegmentMode::Structured);

        let titles: Vec<String> = document.headings().iter().map(|h| h.text_content()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }
}
