use crate::kdp::error::Result;
use crate::kdp::model::{Metadata, unwrap_wrappers};
use crate::kdp::package::reader::EpubArchive;
use crate::kdp::source::{SourceInput, SourceReader};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// EPUB输入读取器
///
/// 按脊柱顺序拼接各内容文档的body，元数据取自OPF的Dublin Core字段。
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubSourceReader;

impl EpubSourceReader {
    /// 取出body的内容；body只包着一个容器元素时逐层展开，让章节标题回到顶层
    fn body_markup(xhtml: &str) -> String {
        let document = Html::parse_document(xhtml);
        document
            .select(&BODY_SELECTOR)
            .next()
            .map(|body| unwrap_wrappers(body).inner_html())
            .unwrap_or_default()
    }
}

impl SourceReader for EpubSourceReader {
    fn read(&self, bytes: &[u8]) -> Result<SourceInput> {
        let mut archive = EpubArchive::from_bytes(bytes.to_vec())?;
        let opf = archive.parse_opf()?;

        let mut metadata = Metadata::new();
        if let Some(title) = opf.title {
            metadata.set("title", title);
        }
        if let Some(author) = opf.creators.into_iter().next() {
            metadata.set("author", author);
        }
        if let Some(language) = opf.language {
            metadata.set("language", language);
        }

        let chapters = archive.get_chapters()?;
        log::info!("从EPUB读取 {} 个内容文档", chapters.len());
        let markup = chapters
            .iter()
            .map(|(_, content)| Self::body_markup(content))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(SourceInput::markup(markup, metadata))
    }
}
