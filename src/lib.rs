pub mod kdp;

// === 核心API重新导出 ===

/// 格式化流水线（主要接口）
pub use kdp::{Pipeline, PipelineState};

/// 错误处理
pub use kdp::{KdpError, Result};

/// 配置
pub use kdp::{BlockSplit, FormatterConfig};

// === 数据结构 ===

/// 内容树与文档
pub use kdp::{ClassSet, ContentNode, Document, ListKind, Metadata, NodeKind, SegmentMode};

/// 目录与章节
pub use kdp::{Chapter, TocEntry};

/// 输入源
pub use kdp::{SourceContent, SourceInput, SourceReader, reader_for_extension};

// === 底层组件（高级用法） ===

/// 流水线各阶段
pub use kdp::{BoundaryDetector, ChapterSegmenter, ContentNormalizer, TocExtractor};

/// 打包与读取
pub use kdp::{EpubArchive, EpubAssembler, EpubPackage};

// === 库信息 ===

/// kdpforge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// kdpforge库的描述
pub const DESCRIPTION: &str = "把书稿整理为符合KDP要求的EPUB";

// === 便捷函数 ===

/// 一次性完成格式化
///
/// 依次执行规范化、分章和组装，书名取自输入的元数据。
///
/// # 参数
/// * `input` - 标记或纯文本块，以及元数据
/// * `config` - 格式化配置
///
/// # 返回值
/// * `Result<Vec<u8>>` - EPUB归档的字节
///
/// # 示例
///
/// ```rust
/// use kdpforge::{FormatterConfig, Metadata, SourceInput};
///
/// let input = SourceInput::markup("<h1>Intro</h1><p>Hello</p>", Metadata::new());
/// let bytes = kdpforge::format(input, &FormatterConfig::default())?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok::<(), kdpforge::KdpError>(())
/// ```
pub fn format(input: SourceInput, config: &FormatterConfig) -> Result<Vec<u8>> {
    Pipeline::new(input, config.clone()).run(None)
}
