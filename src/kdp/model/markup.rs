//! 标记解析与序列化模块
//!
//! 使用scraper把类HTML标记解析为内容树，并把内容树序列化回XHTML。

use crate::kdp::error::{KdpError, Result};
use crate::kdp::model::node::{ContentNode, NodeKind};
use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use scraper::{ElementRef, Html, Node, Selector};

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// 不进入内容树的标签
const SKIPPED_TAGS: [&str; 7] = ["head", "script", "style", "meta", "link", "title", "template"];

/// 只起包裹作用、解析时会被展开的容器标签
const WRAPPER_TAGS: [&str; 4] = ["section", "div", "article", "main"];

/// XHTML中需要自闭合的空元素
const VOID_TAGS: [&str; 10] = [
    "area", "br", "col", "embed", "hr", "img", "input", "source", "track", "wbr",
];

/// 解析类HTML标记为内容树
///
/// 完整的HTML文档只取body中的内容，片段则直接解析。内容只由单个容器元素
/// （section、div、article、main）包裹时逐层展开，让标题回到顶层参与分章；
/// 被展开的容器自身的属性不保留。根节点的直接子节点中只包含空白的文本会被丢弃。
///
/// # 参数
/// * `markup` - 类HTML标记字符串
///
/// # 返回值
/// * `Result<ContentNode>` - 以body为根的内容树；标记中含有二进制控制字符时返回 `UnsupportedInput`
pub fn parse_markup(markup: &str) -> Result<ContentNode> {
    if let Some(c) = markup.chars().find(|c| is_binary_control(*c)) {
        return Err(KdpError::UnsupportedInput(format!(
            "标记中包含二进制控制字符 U+{:04X}",
            c as u32
        )));
    }

    let mut root = ContentNode::root();

    if looks_like_document(markup) {
        let document = Html::parse_document(markup);
        if let Some(body) = document.select(&BODY_SELECTOR).next() {
            append_children(unwrap_wrappers(body), &mut root, true);
        }
    } else {
        let fragment = Html::parse_fragment(markup);
        append_children(unwrap_wrappers(fragment.root_element()), &mut root, true);
    }

    Ok(root)
}

/// 元素只包着一个容器元素（忽略空白文本和注释）时逐层进入该容器
pub(crate) fn unwrap_wrappers(mut element: ElementRef<'_>) -> ElementRef<'_> {
    while let Some(wrapper) = single_wrapper(element) {
        element = wrapper;
    }
    element
}

fn single_wrapper(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut wrapper = None;
    for child in element.children() {
        match child.value() {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Comment(_) => {}
            Node::Element(el) if wrapper.is_none() && WRAPPER_TAGS.contains(&el.name()) => {
                wrapper = ElementRef::wrap(child);
            }
            _ => return None,
        }
    }
    wrapper
}

fn is_binary_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{0C}')
}

fn looks_like_document(markup: &str) -> bool {
    let head: String = markup.chars().take(2048).collect::<String>().to_ascii_lowercase();
    head.contains("<!doctype") || head.contains("<html") || head.contains("<body")
}

fn append_children(element: ElementRef, parent: &mut ContentNode, top_level: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                if top_level && text.trim().is_empty() {
                    continue;
                }
                parent.children.push(ContentNode::text(text));
            }
            Node::Element(el) => {
                if SKIPPED_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    parent.children.push(convert_element(child_element));
                }
            }
            _ => {}
        }
    }
}

fn convert_element(element: ElementRef) -> ContentNode {
    let mut node = ContentNode::new(NodeKind::from_tag(element.value().name()));
    for (name, value) in element.value().attrs() {
        node.set_attr(name, value);
    }
    append_children(element, &mut node, false);
    node
}

/// 把一组节点序列化为XHTML片段
pub fn nodes_to_xhtml(nodes: &[ContentNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

/// 把单个节点及其子树序列化为XHTML
pub fn node_to_xhtml(node: &ContentNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &ContentNode, out: &mut String) {
    let tag = match node.kind.tag_name() {
        Some(tag) => tag,
        None => {
            if let NodeKind::InlineText(text) = &node.kind {
                out.push_str(&escape(text.as_str()));
            }
            return;
        }
    };

    out.push('<');
    out.push_str(tag);
    if !node.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&escape(node.classes.to_attr_value().as_str()));
        out.push('"');
    }
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    if VOID_TAGS.contains(&tag) && node.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &node.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::model::node::ListKind;

    #[test]
    fn test_parse_fragment() {
        let root = parse_markup("<h1 id=\"a\">Intro</h1>\n<p class=\"lead\">Hello <em>there</em></p>").unwrap();
        assert_eq!(root.children.len(), 2);

        let heading = &root.children[0];
        assert_eq!(heading.heading_level(), Some(1));
        assert_eq!(heading.id(), Some("a"));
        assert_eq!(heading.text_content(), "Intro");

        let paragraph = &root.children[1];
        assert_eq!(paragraph.kind, NodeKind::Paragraph);
        assert!(paragraph.classes.contains("lead"));
        assert_eq!(paragraph.text_content(), "Hello there");
    }

    #[test]
    fn test_parse_full_document_uses_body() {
        let markup = r#"<!DOCTYPE html>
<html><head><title>ignored</title><style>p {}</style></head>
<body><h2>Part</h2><ul><li>one</li><li>two</li></ul></body></html>"#;
        let root = parse_markup(markup).unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].heading_level(), Some(2));
        assert_eq!(
            root.children[1].kind,
            NodeKind::ListContainer(ListKind::Unordered)
        );
        assert_eq!(root.children[1].children.len(), 2);
        assert!(!root.text_content().contains("ignored"));
    }

    #[test]
    fn test_single_wrapper_is_unwrapped() {
        let markup = r#"<html><body><div id="main"><h1>A</h1><p>x</p><h1>B</h1><p>y</p></div></body></html>"#;
        let root = parse_markup(markup).unwrap();
        assert_eq!(root.children.len(), 4);
        assert_eq!(root.children[0].heading_level(), Some(1));
        assert_eq!(root.children[2].text_content(), "B");

        let nested = parse_markup("<article>\n  <!-- c --><section><h2>T</h2><p>t</p></section>\n</article>").unwrap();
        let kinds: Vec<Option<u8>> = nested.children.iter().map(ContentNode::heading_level).collect();
        assert_eq!(kinds, vec![Some(2), None]);
    }

    #[test]
    fn test_sibling_wrappers_are_kept() {
        let root = parse_markup("<div><p>a</p></div><div><p>b</p></div>").unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].kind, NodeKind::GenericElement("div".to_string()));

        let with_text = parse_markup("<div><h1>A</h1></div>loose text").unwrap();
        assert_eq!(with_text.children.len(), 2);
    }

    #[test]
    fn test_parse_empty_markup() {
        let root = parse_markup("   \n").unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_binary_input_is_unsupported() {
        let result = parse_markup("PK\u{3}\u{4}\0\0binary");
        assert!(matches!(result, Err(KdpError::UnsupportedInput(_))));
    }

    #[test]
    fn test_serialize_escapes_and_void_tags() {
        let root = parse_markup("<p class=\"x\">a &amp; b<br>c</p>").unwrap();
        let xhtml = nodes_to_xhtml(&root.children);
        assert_eq!(xhtml, "<p class=\"x\">a &amp; b<br/>c</p>");
    }
}
