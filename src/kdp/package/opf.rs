//! OPF包文档模块
//!
//! 生成与解析OPF（Open Packaging Format）文件：元数据、清单和脊柱。

use crate::kdp::error::{KdpError, Result};
use crate::kdp::package::manifest::ManifestItem;
use crate::kdp::package::spine::SpineItem;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// OPF文件内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// 唯一标识符
    pub identifier: Option<String>,
    /// 书名
    pub title: Option<String>,
    /// 语言
    pub language: Option<String>,
    /// 作者列表
    pub creators: Vec<String>,
    /// 最后修改时间（dcterms:modified）
    pub modified: Option<String>,
    /// 清单项，保持文档中的顺序
    pub manifest: Vec<ManifestItem>,
    /// 脊柱(阅读顺序)
    pub spine: Vec<SpineItem>,
    /// 脊柱的目录引用
    pub spine_toc: Option<String>,
}

impl Opf {
    /// 序列化为EPUB 3 OPF文档
    pub fn to_xml(&self) -> String {
        let mut opf = String::new();
        opf.push_str(&format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"{}\" unique-identifier=\"BookId\">\n  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n",
            escape(self.version.as_str())
        ));

        if let Some(identifier) = &self.identifier {
            opf.push_str(&format!(
                "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
                escape(identifier.as_str())
            ));
        }
        if let Some(title) = &self.title {
            opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape(title.as_str())));
        }
        if let Some(language) = &self.language {
            opf.push_str(&format!(
                "    <dc:language>{}</dc:language>\n",
                escape(language.as_str())
            ));
        }
        for creator in &self.creators {
            opf.push_str(&format!("    <dc:creator>{}</dc:creator>\n", escape(creator.as_str())));
        }
        if let Some(modified) = &self.modified {
            opf.push_str(&format!(
                "    <meta property=\"dcterms:modified\">{}</meta>\n",
                escape(modified.as_str())
            ));
        }

        opf.push_str("  </metadata>\n  <manifest>\n");
        for item in &self.manifest {
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
                escape(item.id.as_str()),
                escape(item.href.as_str()),
                escape(item.media_type.as_str())
            ));
            if let Some(properties) = &item.properties {
                opf.push_str(&format!(" properties=\"{}\"", escape(properties.as_str())));
            }
            opf.push_str("/>\n");
        }

        match &self.spine_toc {
            Some(toc) => opf.push_str(&format!("  </manifest>\n  <spine toc=\"{}\">\n", escape(toc.as_str()))),
            None => opf.push_str("  </manifest>\n  <spine>\n"),
        }
        for item in &self.spine {
            if item.is_linear() {
                opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape(item.idref.as_str())));
            } else {
                opf.push_str(&format!(
                    "    <itemref idref=\"{}\" linear=\"no\"/>\n",
                    escape(item.idref.as_str())
                ));
            }
        }
        opf.push_str("  </spine>\n</package>\n");
        opf
    }

    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Opf>` - 解析后的OPF信息
    pub fn parse_xml(xml_content: &str) -> Result<Opf> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut opf = Opf::default();
        let mut current_section = String::new();
        let mut current_element = String::new();
        let mut current_property = String::new();
        let mut text_content = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    match local_name.as_str() {
                        "package" => {
                            opf.version = Self::attribute(e, b"version")?.unwrap_or_default();
                        }
                        "metadata" | "manifest" => {
                            current_section = local_name.clone();
                        }
                        "spine" => {
                            opf.spine_toc = Self::attribute(e, b"toc")?;
                            current_section = local_name.clone();
                        }
                        "item" if current_section == "manifest" => {
                            Self::parse_manifest_item(e, &mut opf.manifest)?;
                        }
                        "itemref" if current_section == "spine" => {
                            Self::parse_spine_item(e, &mut opf.spine)?;
                        }
                        _ if current_section == "metadata" => {
                            current_property = Self::attribute(e, b"property")?.unwrap_or_default();
                            current_element = local_name.clone();
                            text_content.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"item" if current_section == "manifest" => {
                        Self::parse_manifest_item(e, &mut opf.manifest)?;
                    }
                    b"itemref" if current_section == "spine" => {
                        Self::parse_spine_item(e, &mut opf.spine)?;
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::End(ref e) => {
                    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    match local_name.as_str() {
                        "metadata" | "manifest" | "spine" => {
                            current_section.clear();
                        }
                        _ if current_section == "metadata" && local_name == current_element => {
                            Self::process_metadata_text(
                                &mut opf,
                                &current_element,
                                &current_property,
                                text_content.trim(),
                            );
                            current_element.clear();
                            current_property.clear();
                            text_content.clear();
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if opf.manifest.is_empty() && opf.spine.is_empty() && opf.version.is_empty() {
            return Err(KdpError::OpfParseError("没有找到package元素".to_string()));
        }

        Ok(opf)
    }

    fn process_metadata_text(opf: &mut Opf, element: &str, property: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        match element {
            "title" if opf.title.is_none() => opf.title = Some(text.to_string()),
            "language" if opf.language.is_none() => opf.language = Some(text.to_string()),
            "identifier" if opf.identifier.is_none() => opf.identifier = Some(text.to_string()),
            "creator" => opf.creators.push(text.to_string()),
            "meta" if property == "dcterms:modified" => opf.modified = Some(text.to_string()),
            _ => {}
        }
    }

    /// 读取元素的指定属性
    fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| KdpError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            if attr.key.local_name().as_ref() == name {
                return Ok(Some(attr.unescape_value()?.to_string()));
            }
        }
        Ok(None)
    }

    fn parse_manifest_item(e: &BytesStart, manifest: &mut Vec<ManifestItem>) -> Result<()> {
        let id = Self::attribute(e, b"id")?.unwrap_or_default();
        let href = Self::attribute(e, b"href")?.unwrap_or_default();
        let media_type = Self::attribute(e, b"media-type")?.unwrap_or_default();

        if id.is_empty() || href.is_empty() {
            return Ok(());
        }

        let mut item = ManifestItem::new(id, href, media_type);
        item.properties = Self::attribute(e, b"properties")?;
        manifest.push(item);
        Ok(())
    }

    fn parse_spine_item(e: &BytesStart, spine: &mut Vec<SpineItem>) -> Result<()> {
        let idref = Self::attribute(e, b"idref")?.unwrap_or_default();
        let linear = Self::attribute(e, b"linear")?.map(|v| v != "no").unwrap_or(true);

        if !idref.is_empty() {
            spine.push(SpineItem::with_linear(idref, linear));
        }
        Ok(())
    }

    /// 根据ID获取清单项
    pub fn get_manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// 获取导航文档的路径
    pub fn get_nav_path(&self) -> Option<String> {
        self.manifest
            .iter()
            .find(|item| item.is_nav())
            .map(|item| item.href.clone())
    }

    /// 获取NCX文件的路径，优先使用脊柱的toc引用
    pub fn get_ncx_path(&self) -> Option<String> {
        self.spine_toc
            .as_deref()
            .and_then(|id| self.get_manifest_item(id))
            .or_else(|| self.manifest.iter().find(|item| item.is_ncx()))
            .map(|item| item.href.clone())
    }

    /// 获取所有线性阅读的章节文件路径(按阅读顺序)
    ///
    /// 导航文档虽然可能出现在脊柱中，但不算作章节。
    pub fn get_chapter_paths(&self) -> Vec<String> {
        self.spine
            .iter()
            .filter(|spine_item| spine_item.is_linear())
            .filter_map(|spine_item| self.get_manifest_item(&spine_item.idref))
            .filter(|item| item.is_xhtml() && !item.is_nav())
            .map(|item| item.href.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::package::manifest::MEDIA_TYPE_XHTML;

    #[test]
    fn test_basic_opf_structure() {
        let simple_opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>Sample Book</dc:title>
<dc:creator>Sample Author</dc:creator>
<dc:language>en</dc:language>
</metadata>
<manifest>
<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
<item id="item1" href="chapter1.xhtml" media-type="application/xhtml+xml"/>
</manifest>
<spine>
<itemref idref="nav"/>
<itemref idref="item1"/>
</spine>
</package>"#;

        let opf = Opf::parse_xml(simple_opf).expect("解析基本OPF失败");
        assert_eq!(opf.version, "3.0");
        assert_eq!(opf.title.as_deref(), Some("Sample Book"));
        assert_eq!(opf.creators, vec!["Sample Author".to_string()]);
        assert_eq!(opf.language.as_deref(), Some("en"));
        assert_eq!(opf.manifest.len(), 2);
        assert_eq!(opf.spine.len(), 2);
        assert_eq!(opf.get_nav_path(), Some("nav.xhtml".to_string()));
        assert_eq!(opf.get_chapter_paths(), vec!["chapter1.xhtml".to_string()]);
    }

    #[test]
    fn test_written_opf_parses_back() {
        let opf = Opf {
            version: "3.0".to_string(),
            identifier: Some("urn:uuid:1234".to_string()),
            title: Some("Tom & Jerry".to_string()),
            language: Some("en".to_string()),
            creators: vec!["Someone".to_string()],
            modified: Some("2024-01-01T00:00:00Z".to_string()),
            manifest: vec![
                ManifestItem::with_properties("nav", "nav.xhtml", MEDIA_TYPE_XHTML, "nav"),
                ManifestItem::new("chapter_1", "chapter_1.xhtml", MEDIA_TYPE_XHTML),
            ],
            spine: vec![SpineItem::new("nav"), SpineItem::new("chapter_1")],
            spine_toc: Some("ncx".to_string()),
        };

        let xml = opf.to_xml();
        assert!(xml.contains("Tom &amp; Jerry"));
        assert_eq!(Opf::parse_xml(&xml).unwrap(), opf);
    }

    #[test]
    fn test_non_linear_spine_items_skipped() {
        let xml = r#"<package version="3.0"><manifest>
<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
<item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
</manifest><spine><itemref idref="a" linear="no"/><itemref idref="b"/></spine></package>"#;
        let opf = Opf::parse_xml(xml).unwrap();
        assert_eq!(opf.get_chapter_paths(), vec!["b.xhtml".to_string()]);
    }
}
