//! 内容节点模块
//!
//! 定义规范化内容模型中的树节点及其class集合。

use std::collections::BTreeMap;

/// 列表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// 有序列表（ol）
    Ordered,
    /// 无序列表（ul）
    Unordered,
}

impl ListKind {
    /// 对应的HTML标签名
    pub fn tag_name(&self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

/// 节点类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// 标题，级别在1到6之间
    Heading(u8),
    /// 段落
    Paragraph,
    /// 列表容器
    ListContainer(ListKind),
    /// 列表项
    ListItem,
    /// 行内文本
    InlineText(String),
    /// 其他元素，保存原始标签名
    GenericElement(String),
}

impl NodeKind {
    /// 根据HTML标签名确定节点类型
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                NodeKind::Heading(tag.as_bytes()[1] - b'0')
            }
            "p" => NodeKind::Paragraph,
            "ul" => NodeKind::ListContainer(ListKind::Unordered),
            "ol" => NodeKind::ListContainer(ListKind::Ordered),
            "li" => NodeKind::ListItem,
            _ => NodeKind::GenericElement(tag),
        }
    }

    /// 对应的HTML标签名，文本节点返回None
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            NodeKind::Heading(level) => Some(HEADING_TAGS[(*level as usize).clamp(1, 6) - 1]),
            NodeKind::Paragraph => Some("p"),
            NodeKind::ListContainer(kind) => Some(kind.tag_name()),
            NodeKind::ListItem => Some("li"),
            NodeKind::InlineText(_) => None,
            NodeKind::GenericElement(tag) => Some(tag.as_str()),
        }
    }
}

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// class属性的集合表示
///
/// 保持插入顺序，重复插入同一个token不会产生任何变化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSet {
    tokens: Vec<String>,
}

impl ClassSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从空白分隔的class属性值解析
    pub fn parse(value: &str) -> Self {
        let mut set = Self::new();
        for token in value.split_whitespace() {
            set.insert(token);
        }
        set
    }

    /// 插入token，已存在时返回false
    pub fn insert(&mut self, token: &str) -> bool {
        if self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// 检查是否包含指定token
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// 序列化为class属性值
    pub fn to_attr_value(&self) -> String {
        self.tokens.join(" ")
    }
}

/// 内容树节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    /// 节点类型
    pub kind: NodeKind,
    /// 除class以外的属性
    pub attributes: BTreeMap<String, String>,
    /// class属性
    pub classes: ClassSet,
    /// 子节点
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// 创建指定类型的空节点
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            classes: ClassSet::new(),
            children: Vec::new(),
        }
    }

    /// 创建文本节点
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::new(NodeKind::InlineText(text.into()))
    }

    /// 创建只包含一段文本的段落
    pub fn paragraph<S: Into<String>>(text: S) -> Self {
        Self::new(NodeKind::Paragraph).with_child(Self::text(text))
    }

    /// 创建只包含一段文本的标题
    ///
    /// 级别会被限制在1到6之间。
    pub fn heading<S: Into<String>>(level: u8, text: S) -> Self {
        Self::new(NodeKind::Heading(level.clamp(1, 6))).with_child(Self::text(text))
    }

    /// 创建作为树根的通用节点
    pub fn root() -> Self {
        Self::new(NodeKind::GenericElement("body".to_string()))
    }

    /// 追加子节点（构建器风格）
    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }

    /// 设置属性（构建器风格）
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// 设置属性，`class` 会被解析进class集合
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name == "class" {
            for token in value.split_whitespace() {
                self.classes.insert(token);
            }
        } else {
            self.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// 标题级别，非标题节点返回None
    ///
    /// 直接构造的越界级别会被限制在1到6之间。
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading(level) => Some(level.clamp(1, 6)),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// 节点的id属性
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: &str) {
        self.attributes.insert("id".to_string(), id.to_string());
    }

    /// 递归收集节点下的全部文本
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        if let NodeKind::InlineText(text) = &self.kind {
            result.push_str(text);
        }
        for child in &self.children {
            child.collect_text(result);
        }
    }

    /// 按文档顺序（先序）访问节点及其所有后代
    pub fn walk<'a, F: FnMut(&'a ContentNode)>(&'a self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// 按文档顺序（先序）可变地访问节点及其所有后代
    pub fn walk_mut<F: FnMut(&mut ContentNode)>(&mut self, visit: &mut F) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// 节点及其所有后代的数量
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(ContentNode::count_nodes).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_from_tag() {
        assert_eq!(NodeKind::from_tag("h3"), NodeKind::Heading(3));
        assert_eq!(NodeKind::from_tag("P"), NodeKind::Paragraph);
        assert_eq!(
            NodeKind::from_tag("ol"),
            NodeKind::ListContainer(ListKind::Ordered)
        );
        assert_eq!(NodeKind::from_tag("li"), NodeKind::ListItem);
        assert_eq!(
            NodeKind::from_tag("em"),
            NodeKind::GenericElement("em".to_string())
        );
        assert_eq!(
            NodeKind::from_tag("h7"),
            NodeKind::GenericElement("h7".to_string())
        );
    }

    #[test]
    fn test_class_set_is_idempotent() {
        let mut classes = ClassSet::parse("intro  lead intro");
        assert_eq!(classes.len(), 2);
        assert!(!classes.insert("lead"));
        assert!(classes.insert("kdp-paragraph"));
        assert_eq!(classes.to_attr_value(), "intro lead kdp-paragraph");
    }

    #[test]
    fn test_text_content_and_attrs() {
        let node = ContentNode::new(NodeKind::Paragraph)
            .with_attr("class", "a b")
            .with_attr("id", "p1")
            .with_child(ContentNode::text("Hello, "))
            .with_child(
                ContentNode::new(NodeKind::GenericElement("em".to_string()))
                    .with_child(ContentNode::text("world")),
            );

        assert_eq!(node.text_content(), "Hello, world");
        assert_eq!(node.id(), Some("p1"));
        assert!(node.classes.contains("b"));
        assert!(!node.attributes.contains_key("class"));
        assert_eq!(node.count_nodes(), 4);
    }

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(ContentNode::heading(9, "x").heading_level(), Some(6));
        assert_eq!(ContentNode::heading(0, "x").heading_level(), Some(1));
        assert_eq!(ContentNode::paragraph("x").heading_level(), None);
    }

    #[test]
    fn test_raw_heading_kind_clamped() {
        let deep = ContentNode::new(NodeKind::Heading(9));
        assert_eq!(deep.heading_level(), Some(6));
        assert_eq!(deep.kind.tag_name(), Some("h6"));
        assert_eq!(ContentNode::new(NodeKind::Heading(0)).heading_level(), Some(1));
    }
}
