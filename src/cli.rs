use clap::Parser;
use std::path::PathBuf;

/// 媒体格式选择工具
#[derive(Parser, Debug)]
#[command(name = "fmtsel")]
#[command(version = "1.0")]
#[command(about = "对格式目录执行选择表达式，输出选中的格式", long_about = None)]
pub struct Cli {
    /// 格式目录JSON文件 (站点解析器导出的格式记录数组)
    #[arg(long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub formats: PathBuf,

    /// 格式选择表达式
    #[arg(short = 'f', long = "format", value_name = "EXPR")]
    #[arg(default_value = crate::selector::DEFAULT_EXPR)]
    #[arg(help = "如: bestvideo[height<=720]+bestaudio/best")]
    pub format: String,

    /// 排序字段覆盖 (可逗号分隔，如: abr,ext 或 vcodec:vp9.2)
    #[arg(short = 'S', long = "format-sort", value_name = "FIELDS")]
    #[arg(value_delimiter = ',')]
    pub format_sort: Vec<String>,

    /// 优先选择自由格式 (webm/opus)
    #[arg(long, default_value_t = false)]
    pub prefer_free_formats: bool,

    /// 声明环境没有混流能力 (禁用 "+" 与 mergeall)
    #[arg(long, default_value_t = false)]
    pub no_merge: bool,

    /// 合并输出容器 (如: mp4 或 mp4/mkv)
    #[arg(long, value_name = "EXT")]
    pub merge_output_format: Option<String>,

    /// 仅按当前排序列出目录里的全部格式
    #[arg(long, default_value_t = false)]
    pub list_formats: bool,
}
