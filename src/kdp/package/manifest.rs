//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

/// XHTML内容文档的媒体类型
pub const MEDIA_TYPE_XHTML: &str = "application/xhtml+xml";
/// NCX导航文件的媒体类型
pub const MEDIA_TYPE_NCX: &str = "application/x-dtbncx+xml";
/// CSS样式表的媒体类型
pub const MEDIA_TYPE_CSS: &str = "text/css";

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new<S: Into<String>>(id: S, href: S, media_type: S) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    /// 创建带属性的清单项
    pub fn with_properties<S: Into<String>>(id: S, href: S, media_type: S, properties: S) -> Self {
        Self {
            properties: Some(properties.into()),
            ..Self::new(id, href, media_type)
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        if let Some(properties) = &self.properties {
            properties.split_whitespace().any(|p| p == property)
        } else {
            false
        }
    }

    /// 检查是否为导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为NCX文件
    pub fn is_ncx(&self) -> bool {
        self.media_type == MEDIA_TYPE_NCX
    }

    /// 检查是否为XHTML文件
    pub fn is_xhtml(&self) -> bool {
        self.media_type == MEDIA_TYPE_XHTML
    }
}
