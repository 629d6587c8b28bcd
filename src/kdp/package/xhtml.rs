//! 章节内容文档模块

use crate::kdp::model::nodes_to_xhtml;
use crate::kdp::segment::Chapter;
use quick_xml::escape::escape;

/// 单个章节的内容文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDocument {
    /// 文件名（相对于OPF目录）
    pub filename: String,
    /// 清单ID
    pub manifest_id: String,
    /// 序列化后的XHTML
    pub xhtml: String,
}

/// 生成章节XHTML
///
/// 以章节标题开头的章节直接使用标题的id作为锚点；没有标题的章节把
/// 锚点放在外层section上，保证导航链接总能落到实处。
pub fn chapter_xhtml(
    chapter: &Chapter,
    language: &str,
    class_prefix: &str,
    stylesheet_href: Option<&str>,
) -> String {
    let language = escape(language);
    let stylesheet = stylesheet_href
        .map(|href| format!("\n  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>", escape(href)))
        .unwrap_or_default();
    let section_id = if chapter.starts_with_heading() {
        String::new()
    } else {
        format!(" id=\"{}\"", escape(chapter.anchor_id.as_str()))
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{language}" lang="{language}">
<head>
  <meta charset="UTF-8"/>
  <title>{}</title>{stylesheet}
</head>
<body>
  <section class="{}-chapter" epub:type="chapter"{section_id}>
{}
  </section>
</body>
</html>
"#,
        escape(chapter.title.as_str()),
        escape(class_prefix),
        nodes_to_xhtml(chapter.content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::model::ContentNode;

    #[test]
    fn test_chapter_with_heading() {
        let content = vec![
            ContentNode::heading(1, "Intro").with_attr("id", "heading_0"),
            ContentNode::paragraph("Hello"),
        ];
        let chapter = Chapter {
            title: "Intro".to_string(),
            anchor_id: "heading_0".to_string(),
            content: &content,
            sequence_index: 0,
        };

        let xhtml = chapter_xhtml(&chapter, "en", "kdp", Some("styles/kdp.css"));
        assert!(xhtml.contains("<title>Intro</title>"));
        assert!(xhtml.contains("<h1 id=\"heading_0\">Intro</h1><p>Hello</p>"));
        assert!(xhtml.contains("href=\"styles/kdp.css\""));
        assert!(xhtml.contains("<section class=\"kdp-chapter\" epub:type=\"chapter\">"));
    }

    #[test]
    fn test_chapter_without_heading_gets_section_anchor() {
        let content = vec![ContentNode::paragraph("loose")];
        let chapter = Chapter {
            title: "Chapter 1".to_string(),
            anchor_id: "chapter_1".to_string(),
            content: &content,
            sequence_index: 0,
        };

        let xhtml = chapter_xhtml(&chapter, "en", "kdp", None);
        assert!(xhtml.contains("id=\"chapter_1\""));
        assert!(!xhtml.contains("stylesheet"));
    }
}
