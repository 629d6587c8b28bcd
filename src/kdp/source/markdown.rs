use crate::kdp::error::Result;
use crate::kdp::model::Metadata;
use crate::kdp::source::{SourceInput, SourceReader, decode_utf8};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use std::collections::BTreeMap;

/// Markdown输入读取器
///
/// 渲染为HTML标记后按结构分章，`#` 标题对应 `<h1>`，依此类推。
/// 文档开头的YAML front matter（`---` 包围）作为元数据读取，不进入正文。
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReader;

impl MarkdownReader {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        options
    }

    /// 把Markdown渲染为HTML，同时取出front matter中的元数据
    ///
    /// # 参数
    /// * `text` - Markdown文本
    ///
    /// # 返回值
    /// * `(String, Metadata)` - 渲染后的标记和元数据
    pub fn render(text: &str) -> (String, Metadata) {
        let events: Vec<Event<'_>> = Parser::new_ext(text, Self::options()).collect();

        let mut metadata = Metadata::new();
        let mut front_matter: Option<String> = None;
        for event in &events {
            match event {
                Event::Start(Tag::MetadataBlock(_)) => front_matter = Some(String::new()),
                Event::Text(text) => {
                    if let Some(yaml) = front_matter.as_mut() {
                        yaml.push_str(text);
                    }
                }
                Event::End(TagEnd::MetadataBlock(_)) => {
                    if let Some(yaml) = front_matter.take() {
                        Self::read_front_matter(&yaml, &mut metadata);
                    }
                }
                _ => {}
            }
        }

        let mut markup = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut markup, events.into_iter());
        (markup, metadata)
    }

    fn read_front_matter(yaml: &str, metadata: &mut Metadata) {
        let fields: BTreeMap<String, serde_yml::Value> = match serde_yml::from_str(yaml) {
            Ok(fields) => fields,
            Err(e) => {
                log::warn!("无法解析Markdown front matter，已忽略: {}", e);
                return;
            }
        };
        for (key, value) in fields {
            let value = match value {
                serde_yml::Value::String(s) => s,
                serde_yml::Value::Number(n) => n.to_string(),
                serde_yml::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            metadata.set(&key, value);
        }
    }
}

impl SourceReader for MarkdownReader {
    fn read(&self, bytes: &[u8]) -> Result<SourceInput> {
        let (markup, metadata) = Self::render(decode_utf8(bytes)?);
        Ok(SourceInput::markup(markup, metadata))
    }
}
