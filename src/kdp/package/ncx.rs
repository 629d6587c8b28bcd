//! NCX模块
//!
//! 生成与解析EPUB 2的NCX（Navigation Control file for XML）导航文件，
//! 供不支持EPUB 3导航文档的旧阅读器使用。

use crate::kdp::error::{KdpError, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// 导航点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// 唯一标识符
    pub id: String,
    /// 播放顺序
    pub play_order: u32,
    /// 导航标签文本
    pub label: String,
    /// 内容引用
    pub src: String,
    /// 子导航点
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    pub fn new(id: String, play_order: u32, label: String, src: String) -> Self {
        Self {
            id,
            play_order,
            label,
            src,
            children: Vec::new(),
        }
    }

    /// 添加子导航点
    pub fn add_child(&mut self, child: NavPoint) {
        self.children.push(child);
    }

    /// 导航点的深度（没有子节点时为1）
    pub fn depth(&self) -> u32 {
        1 + self.children.iter().map(NavPoint::depth).max().unwrap_or(0)
    }
}

/// NCX文件内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ncx {
    /// 唯一标识符（dtb:uid）
    pub uid: String,
    /// 文档标题
    pub doc_title: String,
    /// 顶层导航点
    pub nav_points: Vec<NavPoint>,
}

impl Ncx {
    /// 导航树的深度
    pub fn depth(&self) -> u32 {
        self.nav_points.iter().map(NavPoint::depth).max().unwrap_or(1)
    }

    /// 按文档顺序展开所有导航点
    pub fn all_nav_points(&self) -> Vec<&NavPoint> {
        fn collect<'a>(points: &'a [NavPoint], out: &mut Vec<&'a NavPoint>) {
            for point in points {
                out.push(point);
                collect(&point.children, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.nav_points, &mut out);
        out
    }

    /// 序列化为NCX文档
    pub fn to_xml(&self) -> String {
        let mut ncx = String::new();
        ncx.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
"#,
            escape(self.uid.as_str()),
            self.depth(),
            escape(self.doc_title.as_str())
        ));
        for point in &self.nav_points {
            Self::write_nav_point(point, 2, &mut ncx);
        }
        ncx.push_str("  </navMap>\n</ncx>\n");
        ncx
    }

    fn write_nav_point(point: &NavPoint, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        out.push_str(&format!(
            "{pad}<navPoint id=\"{}\" playOrder=\"{}\">\n{pad}  <navLabel>\n{pad}    <text>{}</text>\n{pad}  </navLabel>\n{pad}  <content src=\"{}\"/>\n",
            escape(point.id.as_str()),
            point.play_order,
            escape(point.label.as_str()),
            escape(point.src.as_str()),
        ));
        for child in &point.children {
            Self::write_nav_point(child, indent + 1, out);
        }
        out.push_str(&format!("{pad}</navPoint>\n"));
    }

    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Ncx>` - 解析后的NCX信息
    pub fn parse_xml(xml_content: &str) -> Result<Ncx> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut ncx = Ncx::default();
        let mut found_root = false;
        let mut in_doc_title = false;
        let mut in_nav_label = false;
        let mut text_content = String::new();
        // 导航点解析状态
        let mut nav_point_stack: Vec<NavPoint> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"ncx" => found_root = true,
                    b"docTitle" => in_doc_title = true,
                    b"navPoint" => {
                        let mut point = NavPoint::new(String::new(), 0, String::new(), String::new());
                        for attr_result in e.attributes() {
                            let attr = attr_result
                                .map_err(|err| KdpError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
                            match attr.key.local_name().as_ref() {
                                b"id" => point.id = attr.unescape_value()?.to_string(),
                                b"playOrder" => {
                                    point.play_order = attr.unescape_value()?.parse().unwrap_or(0)
                                }
                                _ => {}
                            }
                        }
                        nav_point_stack.push(point);
                    }
                    b"navLabel" => in_nav_label = true,
                    b"text" => text_content.clear(),
                    _ => {}
                },
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"meta" => {
                        let mut name = String::new();
                        let mut content = String::new();
                        for attr_result in e.attributes() {
                            let attr = attr_result
                                .map_err(|err| KdpError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
                            match attr.key.local_name().as_ref() {
                                b"name" => name = attr.unescape_value()?.to_string(),
                                b"content" => content = attr.unescape_value()?.to_string(),
                                _ => {}
                            }
                        }
                        if name == "dtb:uid" {
                            ncx.uid = content;
                        }
                    }
                    b"content" => {
                        if let Some(point) = nav_point_stack.last_mut() {
                            for attr_result in e.attributes() {
                                let attr = attr_result
                                    .map_err(|err| KdpError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
                                if attr.key.local_name().as_ref() == b"src" {
                                    point.src = attr.unescape_value()?.to_string();
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"text" => {
                        let text = text_content.trim().to_string();
                        if in_nav_label {
                            if let Some(point) = nav_point_stack.last_mut() {
                                point.label = text;
                            }
                        } else if in_doc_title {
                            ncx.doc_title = text;
                        }
                        text_content.clear();
                    }
                    b"docTitle" => in_doc_title = false,
                    b"navLabel" => in_nav_label = false,
                    b"navPoint" => {
                        if let Some(point) = nav_point_stack.pop() {
                            match nav_point_stack.last_mut() {
                                Some(parent) => parent.add_child(point),
                                None => ncx.nav_points.push(point),
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !found_root {
            return Err(KdpError::InvalidEpub("NCX文件缺少ncx根元素".to_string()));
        }

        Ok(ncx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ncx {
        let mut first = NavPoint::new(
            "navpoint_1".to_string(),
            1,
            "Intro & Setup".to_string(),
            "chapter_1.xhtml#heading_0".to_string(),
        );
        first.add_child(NavPoint::new(
            "navpoint_2".to_string(),
            2,
            "Details".to_string(),
            "chapter_1.xhtml#heading_1".to_string(),
        ));
        Ncx {
            uid: "urn:uuid:abc".to_string(),
            doc_title: "Book".to_string(),
            nav_points: vec![
                first,
                NavPoint::new(
                    "navpoint_3".to_string(),
                    3,
                    "End".to_string(),
                    "chapter_2.xhtml#heading_2".to_string(),
                ),
            ],
        }
    }

    #[test]
    fn test_ncx_round_trip() {
        let ncx = sample();
        let xml = ncx.to_xml();
        assert!(xml.contains("<meta name=\"dtb:depth\" content=\"2\"/>"));

        let parsed = Ncx::parse_xml(&xml).unwrap();
        assert_eq!(parsed, ncx);
    }

    #[test]
    fn test_all_nav_points_in_order() {
        let ncx = sample();
        let labels: Vec<&str> = ncx.all_nav_points().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Intro & Setup", "Details", "End"]);
    }

    #[test]
    fn test_parse_rejects_non_ncx() {
        assert!(Ncx::parse_xml("<html></html>").is_err());
    }
}
