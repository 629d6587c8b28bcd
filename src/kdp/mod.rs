pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod package;
pub mod pipeline;
pub mod segment;
pub mod source;
pub mod toc;

// 重新导出错误处理
pub use error::{KdpError, Result};

// 重新导出配置
pub use config::{BlockSplit, DEFAULT_CONFIG_PATH, FormatterConfig};

// 重新导出内容模型
pub use model::{ClassSet, ContentNode, Document, ListKind, Metadata, NodeKind, SegmentMode};

// 重新导出流水线各阶段
pub use normalize::ContentNormalizer;
pub use pipeline::{Pipeline, PipelineState};
pub use segment::{BoundaryDetector, Chapter, ChapterPlan, ChapterSegmenter};
pub use toc::{TocEntry, TocExtractor};

// 重新导出输入源
pub use source::{
    EpubSourceReader,
    HtmlReader,
    MarkdownReader,
    PlainTextReader,
    SourceContent,
    SourceInput,
    SourceReader,
    reader_for_extension,
};

// 重新导出打包相关
pub use package::{EpubArchive, EpubAssembler, EpubPackage};
