//! 内容模型模块
//!
//! 规范化内容树、文档与元数据，以及类HTML标记的解析和序列化。

mod document;
mod markup;
mod node;

pub use document::{Document, Metadata, SegmentMode};
pub use markup::{node_to_xhtml, nodes_to_xhtml, parse_markup};
pub(crate) use markup::unwrap_wrappers;
pub use node::{ClassSet, ContentNode, ListKind, NodeKind};
