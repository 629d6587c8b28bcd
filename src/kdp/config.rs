//! 格式化配置模块
//!
//! 提供流水线各阶段的可调参数，支持从YAML文件加载配置。

use crate::kdp::error::{KdpError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "kdpforge.yaml";

/// 纯文本输入的分块方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSplit {
    /// 以空行分隔段落
    Paragraphs,
    /// 每个非空行单独成块（适合从PDF页面提取的文本）
    Lines,
}

/// 格式化配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// 元数据中没有标题时使用的书名
    pub default_title: String,
    /// 元数据中没有语言时使用的语言
    pub default_language: String,
    /// 规范化时添加的class前缀，如 `kdp` 产生 `kdp-paragraph`
    pub class_prefix: String,
    /// 开启新章节的标题级别
    pub chapter_levels: Vec<u8>,
    /// 启发式模式下，全大写块被视为标题的最大字符数（不含）
    pub heading_max_chars: usize,
    /// 启发式模式下的标题标记
    pub heading_marker: String,
    /// 纯文本输入的分块方式
    pub block_split: BlockSplit,
    /// 是否在包中附带KDP样式表
    pub include_stylesheet: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            default_title: "Untitled".to_string(),
            default_language: "en".to_string(),
            class_prefix: "kdp".to_string(),
            chapter_levels: vec![1, 2],
            heading_max_chars: 100,
            heading_marker: "#".to_string(),
            block_split: BlockSplit::Paragraphs,
            include_stylesheet: true,
        }
    }
}

impl FormatterConfig {
    /// 从指定的YAML文件加载配置
    ///
    /// 文件中缺失的字段使用默认值。
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 加载成功返回配置实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| KdpError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        let config: Self = serde_yml::from_str(&content)
            .map_err(|e| KdpError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 生成默认配置文件
    ///
    /// # 参数
    /// * `path` - 要写入的配置文件路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| KdpError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# kdpforge 格式化配置文件\n# chapter_levels 决定哪些标题级别开启新章节\n# heading_max_chars 与 heading_marker 控制纯文本输入的章节识别\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| KdpError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 尝试从文件加载配置，文件不存在时返回默认配置
    ///
    /// 文件存在但内容无效时仍然返回错误。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::debug!("配置文件 {} 不存在，使用默认配置", path.as_ref().display());
            Ok(Self::default())
        }
    }

    /// 检查配置取值是否合法
    pub fn validate(&self) -> Result<()> {
        if self.chapter_levels.is_empty() {
            return Err(KdpError::ConfigError("chapter_levels 不能为空".to_string()));
        }
        if let Some(level) = self.chapter_levels.iter().find(|l| !(1..=6).contains(*l)) {
            return Err(KdpError::ConfigError(format!(
                "chapter_levels 中的标题级别必须在1到6之间, 找到: {}",
                level
            )));
        }
        if self.class_prefix.trim().is_empty() {
            return Err(KdpError::ConfigError("class_prefix 不能为空".to_string()));
        }
        Ok(())
    }

    /// 判断某个标题级别是否开启新章节
    pub fn starts_chapter(&self, level: u8) -> bool {
        self.chapter_levels.contains(&level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatterConfig::default();
        assert_eq!(config.default_title, "Untitled");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.heading_max_chars, 100);
        assert!(config.starts_chapter(1));
        assert!(config.starts_chapter(2));
        assert!(!config.starts_chapter(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kdpforge.yaml");

        FormatterConfig::generate_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# kdpforge"));

        let config = FormatterConfig::from_file(&path).unwrap();
        assert_eq!(config, FormatterConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        fs::write(&path, "heading_max_chars: 40\nblock_split: lines\n").unwrap();

        let config = FormatterConfig::from_file(&path).unwrap();
        assert_eq!(config.heading_max_chars, 40);
        assert_eq!(config.block_split, BlockSplit::Lines);
        assert_eq!(config.default_title, "Untitled");
    }

    #[test]
    fn test_invalid_chapter_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "chapter_levels: [1, 7]\n").unwrap();

        match FormatterConfig::from_file(&path) {
            Err(KdpError::ConfigError(msg)) => assert!(msg.contains("7")),
            other => panic!("期望ConfigError, 得到 {:?}", other),
        }
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormatterConfig::load_or_default(dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config, FormatterConfig::default());
    }
}
