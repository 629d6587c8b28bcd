use std::io::{Cursor, Read, Seek};
use zip::{CompressionMethod, ZipArchive};

use crate::kdp::error::{KdpError, Result};
use crate::kdp::package::assembler::EPUB_MIMETYPE;
use crate::kdp::package::container::{CONTAINER_PATH, Container};
use crate::kdp::package::nav::NavDocument;
use crate::kdp::package::ncx::Ncx;
use crate::kdp::package::opf::Opf;

/// 书籍基本信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub language: Option<String>,
}

/// 已打开的EPUB归档
pub struct EpubArchive<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl EpubArchive<Cursor<Vec<u8>>> {
    /// 从内存中的字节打开EPUB
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// 打开EPUB归档并验证mimetype
    ///
    /// # 参数
    /// * `reader` - 归档数据源
    ///
    /// # 返回值
    /// * `Result<EpubArchive<R>>` - 成功返回归档，mimetype缺失或错误时返回相应错误
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut epub = EpubArchive { archive };
        epub.validate()?;
        Ok(epub)
    }

    fn validate(&mut self) -> Result<()> {
        let mut file = match self.archive.by_name("mimetype") {
            Ok(file) => file,
            Err(_) => return Err(KdpError::MissingMimetype),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let content = content.trim();
        if content != EPUB_MIMETYPE {
            return Err(KdpError::InvalidMimetype {
                expected: EPUB_MIMETYPE.to_string(),
                found: content.to_string(),
            });
        }
        log::debug!("mimetype验证通过");
        Ok(())
    }

    /// 检查归档布局：mimetype必须是第一个条目且不压缩
    pub fn check_layout(&mut self) -> Result<()> {
        let first = self.archive.by_index(0)?;
        if first.name() != "mimetype" {
            return Err(KdpError::InvalidEpub(format!(
                "第一个条目应为mimetype，实际为 {}",
                first.name()
            )));
        }
        if first.compression() != CompressionMethod::Stored {
            return Err(KdpError::InvalidEpub("mimetype条目不能压缩".to_string()));
        }
        Ok(())
    }

    /// 列出归档中的所有条目
    pub fn list_files(&mut self) -> Result<Vec<String>> {
        let mut files = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            files.push(file.name().to_string());
        }
        Ok(files)
    }

    /// 提取指定文件的文本内容
    ///
    /// # 参数
    /// * `filename` - 归档内的路径
    pub fn extract_file(&mut self, filename: &str) -> Result<String> {
        let mut file = self.archive.by_name(filename)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    pub fn parse_container(&mut self) -> Result<Container> {
        let content = self.extract_file(CONTAINER_PATH)?;
        Container::parse_xml(&content)
    }

    /// 获取主要的OPF文件路径
    pub fn get_opf_path(&mut self) -> Result<String> {
        self.parse_container()?.get_opf_path().ok_or_else(|| {
            KdpError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string())
        })
    }

    /// 获取OPF文件所在的目录，位于根目录时为空串
    pub fn get_opf_directory(&mut self) -> Result<String> {
        let opf_path = self.get_opf_path()?;
        Ok(std::path::Path::new(&opf_path)
            .parent()
            .map(|parent| parent.to_string_lossy().to_string())
            .unwrap_or_default())
    }

    pub fn parse_opf(&mut self) -> Result<Opf> {
        let opf_path = self.get_opf_path()?;
        let content = self.extract_file(&opf_path)?;
        Opf::parse_xml(&content).map_err(|e| match e {
            KdpError::XmlError(xml_err) => KdpError::OpfParseError(format!("XML解析错误: {}", xml_err)),
            other => other,
        })
    }

    fn resolve(&mut self, href: &str) -> Result<String> {
        let dir = self.get_opf_directory()?;
        Ok(if dir.is_empty() {
            href.to_string()
        } else {
            format!("{}/{}", dir, href)
        })
    }

    /// 解析OPF声明的NCX文件；没有NCX时返回None
    pub fn parse_ncx(&mut self) -> Result<Option<Ncx>> {
        let opf = self.parse_opf()?;
        let Some(href) = opf.get_ncx_path() else {
            return Ok(None);
        };
        let path = self.resolve(&href)?;
        let content = self.extract_file(&path)?;
        Ncx::parse_xml(&content).map(Some)
    }

    /// 导航文档中的链接 (文本, 目标)；没有导航文档时为空
    pub fn nav_links(&mut self) -> Result<Vec<(String, String)>> {
        let opf = self.parse_opf()?;
        let Some(href) = opf.get_nav_path() else {
            return Ok(Vec::new());
        };
        let path = self.resolve(&href)?;
        let content = self.extract_file(&path)?;
        Ok(NavDocument::parse_links(&content))
    }

    /// 按脊柱顺序获取章节内容
    ///
    /// # 返回值
    /// * `Result<Vec<(String, String)>>` - (相对OPF的路径, 内容)列表，读取失败的章节被跳过
    pub fn get_chapters(&mut self) -> Result<Vec<(String, String)>> {
        let opf = self.parse_opf()?;
        let mut chapters = Vec::new();

        for path in opf.get_chapter_paths() {
            let full_path = self.resolve(&path)?;
            match self.extract_file(&full_path) {
                Ok(content) => chapters.push((path, content)),
                Err(e) => log::warn!("无法读取章节文件 {}: {}", full_path, e),
            }
        }

        Ok(chapters)
    }

    pub fn book_info(&mut self) -> Result<BookInfo> {
        let opf = self.parse_opf()?;
        Ok(BookInfo {
            title: opf.title.unwrap_or_else(|| "未知标题".to_string()),
            authors: opf.creators,
            language: opf.language,
        })
    }
}
