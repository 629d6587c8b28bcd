//! EPUB组装模块
//!
//! 根据元数据、章节序列和目录构建EPUB包，并序列化为zip归档。

use crate::kdp::config::FormatterConfig;
use crate::kdp::error::{KdpError, Result};
use crate::kdp::model::Document;
use crate::kdp::package::container::{CONTAINER_PATH, Container};
use crate::kdp::package::manifest::{MEDIA_TYPE_CSS, MEDIA_TYPE_NCX, MEDIA_TYPE_XHTML, ManifestItem};
use crate::kdp::package::nav::{NavDocument, NavEntry};
use crate::kdp::package::ncx::{NavPoint, Ncx};
use crate::kdp::package::opf::Opf;
use crate::kdp::package::spine::SpineItem;
use crate::kdp::package::style::{STYLESHEET_HREF, kdp_stylesheet};
use crate::kdp::package::xhtml::{ChapterDocument, chapter_xhtml};
use crate::kdp::segment::Chapter;
use crate::kdp::toc::TocEntry;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::{Cursor, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// EPUB的mimetype
pub const EPUB_MIMETYPE: &str = "application/epub+zip";
/// 归档内的内容目录
pub const CONTENT_DIR: &str = "OEBPS";
/// 导航文档的清单ID
pub const NAV_ID: &str = "nav";
/// 导航文档文件名
pub const NAV_HREF: &str = "nav.xhtml";
/// NCX的清单ID
pub const NCX_ID: &str = "ncx";
/// NCX文件名
pub const NCX_HREF: &str = "toc.ncx";
/// OPF文件名
pub const OPF_HREF: &str = "content.opf";

/// 组装完成、等待写入归档的EPUB包
#[derive(Debug, Clone)]
pub struct EpubPackage {
    /// 唯一标识符
    pub identifier: String,
    /// 最终使用的书名
    pub title: String,
    /// 最终使用的语言
    pub language: String,
    /// 清单
    pub manifest: Vec<ManifestItem>,
    /// 脊柱，第一项总是导航文档
    pub spine: Vec<SpineItem>,
    /// OPF文档
    pub opf_document: String,
    /// EPUB 3导航文档
    pub nav_document: String,
    /// NCX文档
    pub ncx_document: String,
    /// 按章节顺序排列的内容文档
    pub chapter_documents: Vec<ChapterDocument>,
    /// 样式表内容
    pub stylesheet: Option<String>,
}

impl EpubPackage {
    /// 归档内的完整路径
    fn entry_path(href: &str) -> String {
        format!("{}/{}", CONTENT_DIR, href)
    }

    /// 把包写入zip归档
    ///
    /// 条目顺序固定：mimetype（不压缩）、container.xml、OPF、NCX、导航文档、
    /// 各章节、样式表。
    ///
    /// # 参数
    /// * `sink` - 可写可定位的目标
    ///
    /// # 返回值
    /// * `Result<W>` - 写入完成后交还的目标；任何写入失败都作为 `PackagingError` 返回
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored)
            .map_err(packaging_error("mimetype"))?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())
            .map_err(packaging_error("mimetype"))?;

        let container = Container::for_package(&Self::entry_path(OPF_HREF)).to_xml();
        let mut entries: Vec<(String, &str)> = vec![
            (CONTAINER_PATH.to_string(), container.as_str()),
            (Self::entry_path(OPF_HREF), self.opf_document.as_str()),
            (Self::entry_path(NCX_HREF), self.ncx_document.as_str()),
            (Self::entry_path(NAV_HREF), self.nav_document.as_str()),
        ];
        for document in &self.chapter_documents {
            entries.push((Self::entry_path(&document.filename), document.xhtml.as_str()));
        }
        if let Some(stylesheet) = &self.stylesheet {
            entries.push((Self::entry_path(STYLESHEET_HREF), stylesheet.as_str()));
        }

        for (path, content) in entries {
            zip.start_file(path.as_str(), deflated)
                .map_err(packaging_error(&path))?;
            zip.write_all(content.as_bytes())
                .map_err(packaging_error(&path))?;
        }

        zip.finish().map_err(packaging_error("归档结尾"))
    }

    /// 把包序列化为内存中的字节
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write_to(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }
}

fn packaging_error<E: Display>(entry: &str) -> impl FnOnce(E) -> KdpError + '_ {
    move |e| KdpError::PackagingError(format!("写入 {} 失败: {}", entry, e))
}

/// EPUB组装器
#[derive(Debug, Clone)]
pub struct EpubAssembler {
    default_title: String,
    default_language: String,
    class_prefix: String,
    include_stylesheet: bool,
}

impl Default for EpubAssembler {
    fn default() -> Self {
        Self::from_config(&FormatterConfig::default())
    }
}

impl EpubAssembler {
    pub fn from_config(config: &FormatterConfig) -> Self {
        Self {
            default_title: config.default_title.clone(),
            default_language: config.default_language.clone(),
            class_prefix: config.class_prefix.clone(),
            include_stylesheet: config.include_stylesheet,
        }
    }

    /// 构建EPUB包
    ///
    /// 章节为空时生成一个包含文档原始内容的占位章节，保证脊柱非空。
    ///
    /// # 参数
    /// * `document` - 已规范化的文档
    /// * `chapters` - 分章结果
    /// * `toc` - 目录条目
    /// * `title` - 显式指定的书名，优先于元数据
    ///
    /// # 返回值
    /// * `Result<EpubPackage>` - 组装好的包；章节文件名冲突时返回 `PackagingError`
    pub fn build(
        &self,
        document: &Document,
        chapters: &[Chapter],
        toc: &[TocEntry],
        title: Option<&str>,
    ) -> Result<EpubPackage> {
        let placeholder;
        let chapters = if chapters.is_empty() {
            log::warn!("没有可用的章节，使用占位章节");
            placeholder = [Chapter {
                title: "Chapter 1".to_string(),
                anchor_id: "chapter_1".to_string(),
                content: document.blocks(),
                sequence_index: 0,
            }];
            &placeholder[..]
        } else {
            chapters
        };

        let title = document.metadata.resolve_title(title, &self.default_title);
        let language = document.metadata.resolve_language(&self.default_language);
        let identifier = format!("urn:uuid:{}", uuid::Uuid::new_v4());
        let stylesheet_href = self.include_stylesheet.then_some(STYLESHEET_HREF);

        let mut manifest = vec![
            ManifestItem::with_properties(NAV_ID, NAV_HREF, MEDIA_TYPE_XHTML, "nav"),
            ManifestItem::new(NCX_ID, NCX_HREF, MEDIA_TYPE_NCX),
        ];
        let mut spine = vec![SpineItem::new(NAV_ID)];
        let mut chapter_documents = Vec::with_capacity(chapters.len());
        let mut filenames = HashSet::new();

        for chapter in chapters {
            let filename = chapter.filename();
            if !filenames.insert(filename.clone()) {
                return Err(KdpError::PackagingError(format!("章节文件名冲突: {}", filename)));
            }
            let manifest_id = format!("chapter_{}", chapter.sequence_index + 1);

            manifest.push(ManifestItem::new(manifest_id.clone(), filename.clone(), MEDIA_TYPE_XHTML.to_string()));
            spine.push(SpineItem::new(manifest_id.clone()));
            chapter_documents.push(ChapterDocument {
                xhtml: chapter_xhtml(chapter, &language, &self.class_prefix, stylesheet_href),
                filename,
                manifest_id,
            });
        }

        if let Some(href) = stylesheet_href {
            manifest.push(ManifestItem::new("css", href, MEDIA_TYPE_CSS));
        }

        let ids: HashSet<&str> = manifest.iter().map(|item| item.id.as_str()).collect();
        if ids.len() != manifest.len() {
            return Err(KdpError::PackagingError("清单ID重复".to_string()));
        }

        let entries = Self::nav_entries(chapters, toc);
        let nav_document = NavDocument {
            title: title.clone(),
            language: language.clone(),
            entries: entries.clone(),
        }
        .to_xhtml();
        let ncx_document = Self::ncx(&identifier, &title, &entries).to_xml();

        let opf_document = Opf {
            version: "3.0".to_string(),
            identifier: Some(identifier.clone()),
            title: Some(title.clone()),
            language: Some(language.clone()),
            creators: document.metadata.author.iter().cloned().collect(),
            modified: Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            manifest: manifest.clone(),
            spine: spine.clone(),
            spine_toc: Some(NCX_ID.to_string()),
        }
        .to_xml();

        log::info!(
            "组装EPUB: 《{}》, {} 章, 清单 {} 项",
            title,
            chapter_documents.len(),
            manifest.len()
        );

        Ok(EpubPackage {
            identifier,
            title,
            language,
            manifest,
            spine,
            opf_document,
            nav_document,
            ncx_document,
            chapter_documents,
            stylesheet: stylesheet_href.map(|_| kdp_stylesheet(&self.class_prefix)),
        })
    }

    /// 构建EPUB包并序列化为字节
    pub fn assemble(
        &self,
        document: &Document,
        chapters: &[Chapter],
        toc: &[TocEntry],
        title: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.build(document, chapters, toc, title)?.to_bytes()
    }

    /// 每章一个导航条目；章内其他目录条目作为该章的子条目，没有文字的标题不进入导航
    fn nav_entries(chapters: &[Chapter], toc: &[TocEntry]) -> Vec<NavEntry> {
        chapters
            .iter()
            .map(|chapter| {
                let filename = chapter.filename();
                let mut entry = NavEntry::new(
                    chapter.title.clone(),
                    format!("{}#{}", filename, chapter.anchor_id),
                );

                let mut anchors = HashSet::new();
                for node in chapter.content {
                    node.walk(&mut |n| {
                        if let (true, Some(id)) = (n.is_heading(), n.id()) {
                            anchors.insert(id.to_string());
                        }
                    });
                }

                entry.children = toc
                    .iter()
                    .filter(|item| !item.title.is_empty())
                    .filter(|item| item.anchor_id != chapter.anchor_id && anchors.contains(&item.anchor_id))
                    .map(|item| NavEntry::new(item.title.clone(), format!("{}#{}", filename, item.anchor_id)))
                    .collect();
                entry
            })
            .collect()
    }

    fn ncx(identifier: &str, title: &str, entries: &[NavEntry]) -> Ncx {
        fn to_points(entries: &[NavEntry], play_order: &mut u32) -> Vec<NavPoint> {
            entries
                .iter()
                .map(|entry| {
                    *play_order += 1;
                    let mut point = NavPoint::new(
                        format!("navpoint_{}", play_order),
                        *play_order,
                        entry.label.clone(),
                        entry.href.clone(),
                    );
                    point.children = to_points(&entry.children, play_order);
                    point
                })
                .collect()
        }

        let mut play_order = 0;
        Ncx {
            uid: identifier.to_string(),
            doc_title: title.to_string(),
            nav_points: to_points(entries, &mut play_order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::model::{Metadata, SegmentMode, parse_markup};
    use crate::kdp::segment::ChapterSegmenter;
    use crate::kdp::toc::TocExtractor;

    fn document(markup: &str, metadata: Metadata) -> (Document, Vec<TocEntry>) {
        let mut root = parse_markup(markup).unwrap();
        let toc = TocExtractor::extract(&mut root);
        (Document::new(root, metadata, SegmentMode::Structured), toc)
    }

    #[test]
    fn test_build_manifest_and_spine() {
        let (doc, toc) = document(
            "<h1>Intro</h1><p>Hello</p><h3>Aside</h3><h1>End</h1><p>Bye</p>",
            Metadata::new().with_title("Source Title").with_author("Ann"),
        );
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::default().build(&doc, &chapters, &toc, None).unwrap();

        assert_eq!(package.title, "Source Title");
        assert_eq!(package.language, "en");
        let spine: Vec<&str> = package.spine.iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(spine, vec!["nav", "chapter_1", "chapter_2"]);

        let hrefs: Vec<&str> = package.manifest.iter().map(|m| m.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec!["nav.xhtml", "toc.ncx", "chapter_1.xhtml", "chapter_2.xhtml", "styles/kdp.css"]
        );
        assert!(package.opf_document.contains("<dc:creator>Ann</dc:creator>"));

        let links = NavDocument::parse_links(&package.nav_document);
        assert_eq!(
            links,
            vec![
                ("Intro".to_string(), "chapter_1.xhtml#heading_0".to_string()),
                ("Aside".to_string(), "chapter_1.xhtml#heading_1".to_string()),
                ("End".to_string(), "chapter_2.xhtml#heading_2".to_string()),
            ]
        );

        let ncx = Ncx::parse_xml(&package.ncx_document).unwrap();
        assert_eq!(ncx.nav_points.len(), 2);
        assert_eq!(ncx.nav_points[0].children.len(), 1);
    }

    #[test]
    fn test_empty_headings_left_out_of_navigation() {
        let (doc, toc) = document("<h1>Real</h1><p>a</p><h3></h3><p>b</p><h1> </h1><p>c</p>", Metadata::new());
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::default().build(&doc, &chapters, &toc, None).unwrap();

        let links = NavDocument::parse_links(&package.nav_document);
        assert_eq!(
            links,
            vec![
                ("Real".to_string(), "chapter_1.xhtml#heading_0".to_string()),
                ("Chapter 2".to_string(), "chapter_2.xhtml#heading_2".to_string()),
            ]
        );

        let ncx = Ncx::parse_xml(&package.ncx_document).unwrap();
        assert!(ncx.all_nav_points().iter().all(|point| !point.label.is_empty()));
        assert_eq!(ncx.all_nav_points().len(), 2);
    }

    #[test]
    fn test_generated_anchor_unique_in_chapter() {
        let (doc, toc) = document("<p id=\"chapter_1\">x</p>", Metadata::new());
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::default().build(&doc, &chapters, &toc, None).unwrap();

        let xhtml = &package.chapter_documents[0].xhtml;
        assert_eq!(xhtml.matches("id=\"chapter_1\"").count(), 1);
        assert!(xhtml.contains("id=\"chapter_1_1\""));
    }

    #[test]
    fn test_explicit_title_wins() {
        let (doc, toc) = document("<p>x</p>", Metadata::new().with_title("Source"));
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::default()
            .build(&doc, &chapters, &toc, Some("Explicit"))
            .unwrap();
        assert_eq!(package.title, "Explicit");
    }

    #[test]
    fn test_empty_document_gets_placeholder_chapter() {
        let (doc, toc) = document("", Metadata::new());
        let package = EpubAssembler::default().build(&doc, &[], &toc, None).unwrap();

        assert_eq!(package.title, "Untitled");
        assert_eq!(package.spine.len(), 2);
        assert_eq!(package.chapter_documents.len(), 1);
        assert_eq!(package.chapter_documents[0].filename, "chapter_1.xhtml");
    }

    #[test]
    fn test_duplicate_filenames_rejected() {
        let (doc, toc) = document("<h1>A</h1><h1>B</h1>", Metadata::new());
        let mut chapters = ChapterSegmenter::default().segment(&doc);
        chapters[1].sequence_index = 0;

        let result = EpubAssembler::default().build(&doc, &chapters, &toc, None);
        assert!(matches!(result, Err(KdpError::PackagingError(_))));
    }

    #[test]
    fn test_without_stylesheet() {
        let config = FormatterConfig {
            include_stylesheet: false,
            ..FormatterConfig::default()
        };
        let (doc, toc) = document("<p>x</p>", Metadata::new());
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::from_config(&config).build(&doc, &chapters, &toc, None).unwrap();

        assert!(package.stylesheet.is_none());
        assert!(package.manifest.iter().all(|item| item.id != "css"));
        assert!(!package.chapter_documents[0].xhtml.contains("stylesheet"));
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingSink {
        fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_sink_failure_is_packaging_error() {
        let (doc, toc) = document("<p>x</p>", Metadata::new());
        let chapters = ChapterSegmenter::default().segment(&doc);
        let package = EpubAssembler::default().build(&doc, &chapters, &toc, None).unwrap();

        let result = package.write_to(FailingSink);
        assert!(matches!(result, Err(KdpError::PackagingError(_))));
    }
}
