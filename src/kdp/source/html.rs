use crate::kdp::error::Result;
use crate::kdp::model::Metadata;
use crate::kdp::source::{SourceInput, SourceReader, decode_utf8};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("head > title").unwrap());
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[name][content]").unwrap());
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("html[lang]").unwrap());

/// HTML输入读取器
///
/// 标记原样交给流水线；元数据取自 `<title>`、`<meta name="author">` 和 `<html lang>`。
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReader;

impl HtmlReader {
    fn metadata(markup: &str) -> Metadata {
        let document = Html::parse_document(markup);
        let mut metadata = Metadata::new();

        if let Some(title) = document.select(&TITLE_SELECTOR).next() {
            metadata.set("title", title.text().collect());
        }
        for meta in document.select(&META_SELECTOR) {
            if let (Some(name), Some(content)) = (meta.value().attr("name"), meta.value().attr("content")) {
                metadata.set(name, content.to_string());
            }
        }
        if let Some(lang) = document
            .select(&HTML_SELECTOR)
            .next()
            .and_then(|html| html.value().attr("lang"))
        {
            metadata.set("language", lang.to_string());
        }

        metadata
    }
}

impl SourceReader for HtmlReader {
    fn read(&self, bytes: &[u8]) -> Result<SourceInput> {
        let markup = decode_utf8(bytes)?;
        Ok(SourceInput::markup(markup, Self::metadata(markup)))
    }
}
