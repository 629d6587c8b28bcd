//! 输入源模块
//!
//! 把原始字节转换为流水线的输入：类HTML标记或纯文本块，加上元数据。
//! HTML、Markdown和EPUB走结构分章，纯文本走启发式分章。
//! 流水线本身不区分输入格式，格式差异全部由这里的读取器吸收。

mod epub;
mod html;
mod markdown;
mod text;

pub use epub::EpubSourceReader;
pub use html::HtmlReader;
pub use markdown::MarkdownReader;
pub use text::PlainTextReader;

use crate::kdp::config::FormatterConfig;
use crate::kdp::error::{KdpError, Result};
use crate::kdp::model::{Metadata, SegmentMode};

/// 输入内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// 类HTML标记，按结构分章
    Markup(String),
    /// 平铺的纯文本块，按启发式规则分章
    Blocks(Vec<String>),
}

impl SourceContent {
    /// 内容对应的分章方式
    pub fn mode(&self) -> SegmentMode {
        match self {
            SourceContent::Markup(_) => SegmentMode::Structured,
            SourceContent::Blocks(_) => SegmentMode::Heuristic,
        }
    }
}

/// 一次流水线运行的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub content: SourceContent,
    pub metadata: Metadata,
}

impl SourceInput {
    pub fn markup<S: Into<String>>(markup: S, metadata: Metadata) -> Self {
        Self {
            content: SourceContent::Markup(markup.into()),
            metadata,
        }
    }

    pub fn blocks<I, S>(blocks: I, metadata: Metadata) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content: SourceContent::Blocks(blocks.into_iter().map(Into::into).collect()),
            metadata,
        }
    }
}

/// 输入读取器：给定原始字节，产生标记或文本块以及元数据
pub trait SourceReader {
    fn read(&self, bytes: &[u8]) -> Result<SourceInput>;
}

/// 按文件扩展名选择读取器
///
/// # 参数
/// * `extension` - 不含点的扩展名，大小写不敏感
/// * `config` - 格式化配置
///
/// # 返回值
/// * `Result<Box<dyn SourceReader>>` - 对应的读取器；未知扩展名返回 `UnsupportedInput`
pub fn reader_for_extension(extension: &str, config: &FormatterConfig) -> Result<Box<dyn SourceReader>> {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" | "xhtml" => Ok(Box::new(HtmlReader)),
        "md" | "markdown" => Ok(Box::new(MarkdownReader)),
        "txt" => Ok(Box::new(PlainTextReader::new(config.block_split))),
        "epub" => Ok(Box::new(EpubSourceReader)),
        other => Err(KdpError::UnsupportedInput(format!("不支持的输入格式: .{}", other))),
    }
}

/// 把字节解码为UTF-8文本，去掉开头的BOM
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| KdpError::UnsupportedInput(format!("输入不是有效的UTF-8文本: {}", e)))?;
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_for_extension() {
        let config = FormatterConfig::default();
        assert!(reader_for_extension("HTML", &config).is_ok());
        assert!(reader_for_extension("txt", &config).is_ok());

        let markdown = reader_for_extension("md", &config).unwrap();
        let input = markdown.read(b"# One\n\ntext\n").unwrap();
        assert_eq!(input.content.mode(), SegmentMode::Structured);
        assert!(reader_for_extension("epub", &config).is_ok());
        assert!(matches!(
            reader_for_extension("docx", &config),
            Err(KdpError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(decode_utf8(&[0xff, 0xfe, 0x00]), Err(KdpError::UnsupportedInput(_))));
        assert_eq!(decode_utf8("\u{FEFF}abc".as_bytes()).unwrap(), "abc");
    }

    #[test]
    fn test_content_mode() {
        let input = SourceInput::blocks(["A", "b"], Metadata::new());
        assert_eq!(input.content.mode(), SegmentMode::Heuristic);
        assert_eq!(SourceContent::Markup(String::new()).mode(), SegmentMode::Structured);
    }
}
