//! EPUB 3导航文档模块

use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use scraper::{Html, Selector};

static TOC_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav a[href]").unwrap());

/// 导航条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    /// 显示文本
    pub label: String,
    /// 链接目标，如 `chapter_1.xhtml#heading_0`
    pub href: String,
    /// 子条目
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn new(label: String, href: String) -> Self {
        Self {
            label,
            href,
            children: Vec::new(),
        }
    }
}

/// 导航文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavDocument {
    /// 书名，用作文档标题
    pub title: String,
    /// 语言
    pub language: String,
    /// 目录条目
    pub entries: Vec<NavEntry>,
}

impl NavDocument {
    /// 目录标题
    pub const HEADING: &'static str = "Contents";

    /// 序列化为XHTML导航文档
    pub fn to_xhtml(&self) -> String {
        let language = escape(self.language.as_str());
        let mut xhtml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{language}" lang="{language}">
<head>
  <meta charset="UTF-8"/>
  <title>{}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>{}</h1>
"#,
            escape(self.title.as_str()),
            Self::HEADING,
        );
        Self::write_entries(&self.entries, 2, &mut xhtml);
        xhtml.push_str("  </nav>\n</body>\n</html>\n");
        xhtml
    }

    fn write_entries(entries: &[NavEntry], indent: usize, out: &mut String) {
        if entries.is_empty() {
            return;
        }
        let pad = "  ".repeat(indent);
        out.push_str(&format!("{pad}<ol>\n"));
        for entry in entries {
            out.push_str(&format!(
                "{pad}  <li><a href=\"{}\">{}</a>",
                escape(entry.href.as_str()),
                escape(entry.label.as_str())
            ));
            if entry.children.is_empty() {
                out.push_str("</li>\n");
            } else {
                out.push('\n');
                Self::write_entries(&entry.children, indent + 2, out);
                out.push_str(&format!("{pad}  </li>\n"));
            }
        }
        out.push_str(&format!("{pad}</ol>\n"));
    }

    /// 提取导航文档中的所有链接 (文本, 目标)，按文档顺序
    pub fn parse_links(xhtml: &str) -> Vec<(String, String)> {
        let document = Html::parse_document(xhtml);
        document
            .select(&TOC_LINK_SELECTOR)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let label = link.text().collect::<String>().trim().to_string();
                Some((label, href.to_string()))
            })
            .collect()
    }
}
