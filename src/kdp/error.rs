use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KdpError>;

/// 格式化流水线相关的错误类型
#[derive(Error, Debug)]
pub enum KdpError {
    #[error("不支持的输入: {0}")]
    UnsupportedInput(String),

    #[error("流水线阶段顺序错误: 需要处于 {expected} 状态, 当前为 {found}")]
    OrderError {
        expected: &'static str,
        found: &'static str,
    },

    #[error("打包错误: {0}")]
    PackagingError(String),

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidEpub(String),

    #[error("缺少mimetype文件")]
    MissingMimetype,

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF文件解析错误: {0}")]
    OpfParseError(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}
