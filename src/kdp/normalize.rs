//! 内容规范化模块
//!
//! 给标题、段落和列表打上固定的KDP样式class。

use crate::kdp::model::{ContentNode, NodeKind};

/// 内容规范化器
///
/// 只增加class token，不增删或重排节点。重复执行的结果与执行一次相同。
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    prefix: String,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new("kdp")
    }
}

impl ContentNormalizer {
    /// 创建使用指定class前缀的规范化器
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 节点应当获得的class token，不需要标记的节点返回None
    pub fn class_for(&self, node: &ContentNode) -> Option<String> {
        if let Some(level) = node.heading_level() {
            return Some(format!("{}-h{}", self.prefix, level));
        }
        match node.kind {
            NodeKind::Paragraph => Some(format!("{}-paragraph", self.prefix)),
            NodeKind::ListContainer(_) => Some(format!("{}-list", self.prefix)),
            _ => None,
        }
    }

    /// 原地规范化整棵树
    ///
    /// # 返回值
    /// * `usize` - 本次新增的class token数量，已规范化的树返回0
    pub fn normalize(&self, root: &mut ContentNode) -> usize {
        let mut added = 0;
        root.walk_mut(&mut |node| {
            if let Some(class) = self.class_for(node) {
                if node.classes.insert(&class) {
                    added += 1;
                }
            }
        });
        log::debug!("规范化完成，新增 {} 个class", added);
        added
    }
}
