use crate::kdp::config::BlockSplit;
use crate::kdp::error::Result;
use crate::kdp::model::Metadata;
use crate::kdp::source::{SourceInput, SourceReader, decode_utf8};

/// 纯文本输入读取器
///
/// 按配置把文本切成块，交给启发式分章。纯文本不带元数据。
#[derive(Debug, Clone, Copy)]
pub struct PlainTextReader {
    split: BlockSplit,
}

impl Default for PlainTextReader {
    fn default() -> Self {
        Self::new(BlockSplit::Paragraphs)
    }
}

impl PlainTextReader {
    pub fn new(split: BlockSplit) -> Self {
        Self { split }
    }

    /// 把文本切分为非空块
    ///
    /// `Paragraphs` 以空行分隔，块内的换行折叠为空格；`Lines` 每个非空行一块。
    pub fn split_blocks(&self, text: &str) -> Vec<String> {
        match self.split {
            BlockSplit::Lines => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            BlockSplit::Paragraphs => {
                let mut blocks = Vec::new();
                let mut current: Vec<&str> = Vec::new();
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        if !current.is_empty() {
                            blocks.push(current.join(" "));
                            current.clear();
                        }
                    } else {
                        current.push(line);
                    }
                }
                if !current.is_empty() {
                    blocks.push(current.join(" "));
                }
                blocks
            }
        }
    }
}

impl SourceReader for PlainTextReader {
    fn read(&self, bytes: &[u8]) -> Result<SourceInput> {
        let text = decode_utf8(bytes)?;
        let blocks = self.split_blocks(text);
        log::debug!("纯文本切分为 {} 个块", blocks.len());
        Ok(SourceInput::blocks(blocks, Metadata::new()))
    }
}
