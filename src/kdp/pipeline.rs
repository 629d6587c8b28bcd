//! 格式化流水线模块
//!
//! 按 规范化 → 目录提取与分章 → 组装 的顺序驱动一次格式化，阶段只能依次
//! 向前推进。

use crate::kdp::config::FormatterConfig;
use crate::kdp::error::{KdpError, Result};
use crate::kdp::model::{Document, parse_markup};
use crate::kdp::normalize::ContentNormalizer;
use crate::kdp::package::EpubAssembler;
use crate::kdp::segment::{BoundaryDetector, Chapter, ChapterPlan, ChapterSegmenter};
use crate::kdp::source::{SourceContent, SourceInput};
use crate::kdp::toc::{TocEntry, TocExtractor};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Empty,
    Normalized,
    Segmented,
    Assembled,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Empty => "Empty",
            PipelineState::Normalized => "Normalized",
            PipelineState::Segmented => "Segmented",
            PipelineState::Assembled => "Assembled",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 单次格式化流水线
///
/// 一个流水线只处理一份输入。阶段调用顺序错误（包括重复调用已完成的阶段）
/// 返回 `OrderError`，不会自动补跑前面的阶段。
///
/// ```no_run
/// use kdpforge::{FormatterConfig, Metadata, Pipeline, SourceInput};
///
/// let input = SourceInput::markup("<h1>Intro</h1><p>Hello</p>", Metadata::new());
/// let mut pipeline = Pipeline::new(input, FormatterConfig::default());
/// pipeline.normalize()?;
/// pipeline.segment()?;
/// pipeline.assemble(Some("My Book"))?;
/// let bytes = pipeline.into_package_bytes()?;
/// # Ok::<(), kdpforge::KdpError>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: FormatterConfig,
    state: PipelineState,
    input: Option<SourceInput>,
    document: Option<Document>,
    toc: Option<Vec<TocEntry>>,
    plans: Option<Vec<ChapterPlan>>,
    package: Option<Vec<u8>>,
}

impl Pipeline {
    pub fn new(input: SourceInput, config: FormatterConfig) -> Self {
        Self {
            config,
            state: PipelineState::Empty,
            input: Some(input),
            document: None,
            toc: None,
            plans: None,
            package: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    fn expect_state(&self, expected: PipelineState) -> Result<()> {
        if self.state != expected {
            return Err(self.order_error(expected));
        }
        Ok(())
    }

    fn order_error(&self, expected: PipelineState) -> KdpError {
        KdpError::OrderError {
            expected: expected.name(),
            found: self.state.name(),
        }
    }

    /// 解析输入并规范化内容树
    ///
    /// 标记输入按结构解析；纯文本块先经启发式边界识别转换为标题和段落。
    ///
    /// # 返回值
    /// * `Result<()>` - 不处于 `Empty` 状态时返回 `OrderError`；标记无法解析时返回 `UnsupportedInput`
    pub fn normalize(&mut self) -> Result<()> {
        self.expect_state(PipelineState::Empty)?;
        let Some(input) = self.input.as_ref() else {
            return Err(self.order_error(PipelineState::Empty));
        };

        let mode = input.content.mode();
        let mut root = match &input.content {
            SourceContent::Markup(markup) => parse_markup(markup)?,
            SourceContent::Blocks(blocks) => {
                BoundaryDetector::from_config(&self.config).build_tree(blocks.as_slice())
            }
        };
        let metadata = self.input.take().map(|input| input.metadata).unwrap_or_default();

        ContentNormalizer::new(self.config.class_prefix.clone()).normalize(&mut root);
        let document = Document::new(root, metadata, mode);
        log::info!(
            "规范化完成: {:?} 模式, {} 个顶层节点",
            document.mode,
            document.blocks().len()
        );

        self.document = Some(document);
        self.state = PipelineState::Normalized;
        Ok(())
    }

    /// 提取目录并分章
    pub fn segment(&mut self) -> Result<()> {
        self.expect_state(PipelineState::Normalized)?;
        let Some(document) = self.document.as_mut() else {
            return Err(KdpError::OrderError {
                expected: PipelineState::Normalized.name(),
                found: self.state.name(),
            });
        };

        let toc = TocExtractor::extract(&mut document.root);
        let plans = ChapterSegmenter::from_config(&self.config).plan(document);
        log::info!("分章完成: {} 个目录条目, {} 个章节", toc.len(), plans.len());

        self.toc = Some(toc);
        self.plans = Some(plans);
        self.state = PipelineState::Segmented;
        Ok(())
    }

    /// 组装EPUB包
    ///
    /// # 参数
    /// * `title` - 显式书名，优先于元数据中的书名
    ///
    /// # 返回值
    /// * `Result<()>` - 不处于 `Segmented` 状态时返回 `OrderError`；打包失败时返回 `PackagingError`
    pub fn assemble(&mut self, title: Option<&str>) -> Result<()> {
        self.expect_state(PipelineState::Segmented)?;
        let (Some(document), Some(toc), Some(_)) = (&self.document, &self.toc, &self.plans) else {
            return Err(self.order_error(PipelineState::Segmented));
        };

        let bytes = {
            let chapters = self.chapters().unwrap_or_default();
            EpubAssembler::from_config(&self.config).assemble(document, &chapters, toc, title)?
        };
        log::info!("组装完成: {} 字节", bytes.len());

        self.package = Some(bytes);
        self.state = PipelineState::Assembled;
        Ok(())
    }

    /// 依次执行全部阶段并返回包字节
    pub fn run(mut self, title: Option<&str>) -> Result<Vec<u8>> {
        self.normalize()?;
        self.segment()?;
        self.assemble(title)?;
        self.into_package_bytes()
    }

    /// 规范化后的文档
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// 分章后可用的目录
    pub fn toc(&self) -> Option<&[TocEntry]> {
        self.toc.as_deref()
    }

    /// 分章后可用的章节视图
    pub fn chapters(&self) -> Option<Vec<Chapter<'_>>> {
        let document = self.document.as_ref()?;
        let plans = self.plans.as_ref()?;
        Some(plans.iter().map(|plan| plan.resolve(document)).collect())
    }

    /// 组装后可用的包字节
    pub fn package_bytes(&self) -> Option<&[u8]> {
        self.package.as_deref()
    }

    /// 取出包字节，未组装时返回 `OrderError`
    pub fn into_package_bytes(self) -> Result<Vec<u8>> {
        match self.package {
            Some(bytes) if self.state == PipelineState::Assembled => Ok(bytes),
            _ => Err(KdpError::OrderError {
                expected: PipelineState::Assembled.name(),
                found: self.state.name(),
            }),
        }
    }
}
