use clap::Parser;
use kdpforge::kdp::DEFAULT_CONFIG_PATH;
use kdpforge::{FormatterConfig, KdpError, Pipeline, Result, reader_for_extension};
use std::fs;
use std::path::{Path, PathBuf};

/// kdpforge - 把书稿整理为KDP EPUB
#[derive(Parser)]
#[command(name = "kdpforge")]
#[command(about = "把HTML、纯文本或EPUB书稿整理为符合KDP要求的EPUB")]
#[command(version)]
struct Args {
    /// 输入文件路径
    #[arg(help = "要格式化的书稿（.html/.htm/.xhtml/.md/.markdown/.txt/.epub）", required_unless_present = "init_config")]
    input: Option<PathBuf>,

    /// 输出文件路径
    #[arg(short, long, help = "输出EPUB路径，默认为 <输入名>.kdp.epub")]
    output: Option<PathBuf>,

    /// 书名
    #[arg(long, help = "书名，优先于书稿中的元数据")]
    title: Option<String>,

    /// 作者
    #[arg(long, help = "作者，优先于书稿中的元数据")]
    author: Option<String>,

    /// 语言
    #[arg(long, help = "语言代码，如 en、de、pl")]
    language: Option<String>,

    /// 配置文件路径
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, help = "YAML配置文件路径，不存在时使用默认配置")]
    config: PathBuf,

    /// 生成默认配置文件
    #[arg(long, help = "把默认配置写入 --config 指定的路径后退出")]
    init_config: bool,

    /// 详细输出模式
    #[arg(short, long, help = "显示调试日志")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.init_config {
        FormatterConfig::generate_default_config(&args.config)?;
        log::info!("已生成默认配置文件: {}", args.config.display());
        return Ok(());
    }

    let Some(input_path) = args.input else {
        return Err(KdpError::UnsupportedInput("没有指定输入文件".to_string()));
    };
    let config = FormatterConfig::load_or_default(&args.config)?;

    let extension = input_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let reader = reader_for_extension(extension, &config)?;

    log::info!("正在读取书稿: {}", input_path.display());
    let bytes = fs::read(&input_path)?;
    let mut input = reader.read(&bytes)?;

    if let Some(author) = args.author {
        input.metadata.set("author", author);
    }
    if let Some(language) = args.language {
        input.metadata.set("language", language);
    }

    let package = Pipeline::new(input, config).run(args.title.as_deref())?;

    let output = args.output.unwrap_or_else(|| default_output(&input_path));
    fs::write(&output, &package)?;
    log::info!("EPUB已写入: {} ({} 字节)", output.display(), package.len());
    Ok(())
}

/// `book.html` → `book.kdp.epub`
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "book".to_string());
    input.with_file_name(format!("{}.kdp.epub", stem))
}
