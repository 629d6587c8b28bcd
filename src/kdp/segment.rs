//! 分章模块
//!
//! 把规范化后的文档按章节标题切分为有序的章节序列，并提供纯文本输入的
//! 章节边界启发式识别。

use crate::kdp::config::FormatterConfig;
use crate::kdp::model::{ContentNode, Document, NodeKind};
use crate::kdp::toc::{TocExtractor, collect_ids, unique_id};
use std::collections::HashSet;
use std::ops::Range;

/// 章节视图，内容是文档顶层节点的一个切片
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter<'a> {
    /// 章节标题
    pub title: String,
    /// 章节锚点ID
    pub anchor_id: String,
    /// 章节内容（包含开头的章节标题节点）
    pub content: &'a [ContentNode],
    /// 章节序号，从0开始
    pub sequence_index: usize,
}

impl<'a> Chapter<'a> {
    /// 章节正文，不含开头的章节标题节点
    pub fn body(&self) -> &'a [ContentNode] {
        if self.starts_with_heading() {
            &self.content[1..]
        } else {
            self.content
        }
    }

    /// 章节是否以自己的标题节点开头
    pub fn starts_with_heading(&self) -> bool {
        self.content
            .first()
            .filter(|node| node.is_heading())
            .and_then(|node| node.id())
            .is_some_and(|id| id == self.anchor_id)
    }

    /// 章节在包中的文件名
    pub fn filename(&self) -> String {
        chapter_filename(self.sequence_index)
    }
}

/// 第 `index` 章（从0开始）对应的内容文件名
pub fn chapter_filename(index: usize) -> String {
    format!("chapter_{}.xhtml", index + 1)
}

/// 章节计划：章节在文档顶层节点中的区间
///
/// 流水线在阶段之间保存它，需要时再解析为借用文档的 [`Chapter`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPlan {
    pub title: String,
    pub anchor_id: String,
    pub range: Range<usize>,
    pub sequence_index: usize,
}

impl ChapterPlan {
    /// 把计划解析为章节视图
    pub fn resolve<'a>(&self, document: &'a Document) -> Chapter<'a> {
        Chapter {
            title: self.title.clone(),
            anchor_id: self.anchor_id.clone(),
            content: &document.blocks()[self.range.clone()],
            sequence_index: self.sequence_index,
        }
    }
}

/// 章节分割器
#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    chapter_levels: Vec<u8>,
}

impl Default for ChapterSegmenter {
    fn default() -> Self {
        Self::new(vec![1, 2])
    }
}

impl ChapterSegmenter {
    /// 创建分割器
    ///
    /// # 参数
    /// * `chapter_levels` - 开启新章节的标题级别
    pub fn new(chapter_levels: Vec<u8>) -> Self {
        Self { chapter_levels }
    }

    pub fn from_config(config: &FormatterConfig) -> Self {
        Self::new(config.chapter_levels.clone())
    }

    fn is_boundary(&self, node: &ContentNode) -> bool {
        node.heading_level()
            .is_some_and(|level| self.chapter_levels.contains(&level))
    }

    /// 计算章节区间
    ///
    /// 每个章节级标题开启一个新章节，第一个章节级标题之前的内容组成一个
    /// 隐式的开头章节。没有章节标题的章节命名为 `Chapter <n>`，锚点
    /// `chapter_<n>` 与文档中已有的id冲突时追加 `_<k>` 后缀。
    pub fn plan(&self, document: &Document) -> Vec<ChapterPlan> {
        let blocks = document.blocks();
        let mut taken = collect_ids(&document.root);
        let mut plans = Vec::new();
        let mut start = 0;

        for (index, node) in blocks.iter().enumerate() {
            if self.is_boundary(node) && index > start {
                plans.push(self.close(blocks, start..index, plans.len(), &mut taken));
                start = index;
            }
        }
        if start < blocks.len() {
            plans.push(self.close(blocks, start..blocks.len(), plans.len(), &mut taken));
        }

        log::debug!("分章完成，共 {} 章", plans.len());
        plans
    }

    fn close(
        &self,
        blocks: &[ContentNode],
        range: Range<usize>,
        emitted: usize,
        taken: &mut HashSet<String>,
    ) -> ChapterPlan {
        let leading = &blocks[range.start];
        let boundary = self.is_boundary(leading).then_some(leading);

        // 标题文本为空时仍使用标题节点的id作为锚点，只是标题改用生成的名字
        let title = boundary
            .map(TocExtractor::heading_title)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| format!("Chapter {}", emitted + 1));
        let anchor_id = match boundary.and_then(ContentNode::id) {
            Some(id) => id.to_string(),
            None => {
                let anchor_id = unique_id(&format!("chapter_{}", emitted + 1), taken);
                taken.insert(anchor_id.clone());
                anchor_id
            }
        };

        ChapterPlan {
            title,
            anchor_id,
            range,
            sequence_index: emitted,
        }
    }

    /// 把文档切分为章节视图
    pub fn segment<'a>(&self, document: &'a Document) -> Vec<Chapter<'a>> {
        self.plan(document)
            .iter()
            .map(|plan| plan.resolve(document))
            .collect()
    }
}

/// 纯文本块的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// 章节边界，携带标题文本；只有标记没有文字时为空
    Heading(String),
    /// 普通段落
    Paragraph(String),
    /// 空块
    Empty,
}

/// 纯文本输入的章节边界识别器
///
/// 短于阈值且全大写的块，或以标题标记开头的块，被视为章节标题。
/// 这是尽力而为的推断，碰巧又短又全大写的正文也会被当作标题。
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    max_chars: usize,
    marker: String,
    heading_level: u8,
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new(100, "#", 1)
    }
}

impl BoundaryDetector {
    pub fn new<S: Into<String>>(max_chars: usize, marker: S, heading_level: u8) -> Self {
        Self {
            max_chars,
            marker: marker.into(),
            heading_level: heading_level.clamp(1, 6),
        }
    }

    /// 从配置创建，推断出的标题使用最高的章节级别
    pub fn from_config(config: &FormatterConfig) -> Self {
        let level = config.chapter_levels.iter().copied().min().unwrap_or(1);
        Self::new(config.heading_max_chars, config.heading_marker.clone(), level)
    }

    /// 对单个文本块分类
    pub fn classify(&self, block: &str) -> BlockKind {
        let text = block.trim();
        if text.is_empty() {
            return BlockKind::Empty;
        }

        if !self.marker.is_empty() && text.starts_with(self.marker.as_str()) {
            let title = text.trim_start_matches(self.marker.as_str()).trim();
            return BlockKind::Heading(title.to_string());
        }

        if text.chars().count() < self.max_chars && is_all_upper(text) {
            return BlockKind::Heading(text.to_string());
        }

        BlockKind::Paragraph(text.to_string())
    }

    /// 把纯文本块转换为由标题和段落组成的内容树
    pub fn build_tree<S: AsRef<str>>(&self, blocks: &[S]) -> ContentNode {
        let mut root = ContentNode::root();
        let mut headings = 0;
        for block in blocks {
            match self.classify(block.as_ref()) {
                BlockKind::Heading(title) if title.is_empty() => {
                    headings += 1;
                    root.children.push(ContentNode::new(NodeKind::Heading(self.heading_level)));
                }
                BlockKind::Heading(title) => {
                    headings += 1;
                    root.children.push(ContentNode::heading(self.heading_level, title));
                }
                BlockKind::Paragraph(text) => root.children.push(ContentNode::paragraph(text)),
                BlockKind::Empty => {}
            }
        }
        log::debug!("从 {} 个文本块中识别出 {} 个章节标题", blocks.len(), headings);
        root
    }
}

/// 至少包含一个有大小写之分的字符，且所有这类字符都是大写
fn is_all_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
