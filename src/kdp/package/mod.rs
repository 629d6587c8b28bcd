pub mod assembler;
pub mod container;
pub mod manifest;
pub mod nav;
pub mod ncx;
pub mod opf;
pub mod reader;
pub mod spine;
pub mod style;
pub mod xhtml;

// 重新导出组装器
pub use assembler::{EPUB_MIMETYPE, EpubAssembler, EpubPackage};

// 重新导出包结构
pub use container::{Container, RootFile};
pub use manifest::ManifestItem;
pub use nav::{NavDocument, NavEntry};
pub use ncx::{NavPoint, Ncx};
pub use opf::Opf;
pub use spine::SpineItem;
pub use xhtml::ChapterDocument;

// 重新导出归档读取器
pub use reader::{BookInfo, EpubArchive};
