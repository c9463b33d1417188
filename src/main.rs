use clap::Parser;
use std::fs;
use tracing::{debug, error, info};

use crate::common::logger::PrettyLogger;
use crate::common::models::FormatRecord;
use crate::selector::{FormatSelector, SelectorOptions};
use crate::sort::SortOptions;

mod cli;
mod common;
mod selector;
mod sort;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 解析命令行参数
    let args = cli::Cli::parse();

    // 读取格式目录
    info!("读取格式目录: {:?}", args.formats);
    let raw = fs::read_to_string(&args.formats)?;
    let formats: Vec<FormatRecord> = serde_json::from_str(&raw)?;
    info!("目录内格式数量: {}", formats.len());

    let options = SelectorOptions {
        sort: SortOptions {
            fields: args.format_sort.clone(),
            prefer_free_formats: args.prefer_free_formats,
        },
        allow_merge: !args.no_merge,
        merge_output_format: args.merge_output_format.clone(),
    };

    if args.list_formats {
        // 只展示目录，不做选择：用 "all" 套用当前排序
        if formats.is_empty() {
            PrettyLogger::info("目录为空");
            return Ok(());
        }
        let selector = FormatSelector::new("all", options)?;
        PrettyLogger::title("可用格式");
        for selected in selector.select(&formats)? {
            PrettyLogger::format_row(&selected.record);
        }
        return Ok(());
    }

    info!("执行选择表达式: {}", args.format);
    let selector = FormatSelector::new(&args.format, options).map_err(|e| {
        error!("表达式无效: {}", e);
        e
    })?;

    let selections = selector.select(&formats).map_err(|e| {
        error!("选择失败: {}", e);
        e
    })?;

    PrettyLogger::title("选择结果");
    for (i, selected) in selections.iter().enumerate() {
        PrettyLogger::selection(i, selected);
        debug!("选择详情: {:?}", selected);
    }
    PrettyLogger::separator();
    PrettyLogger::success(format!("共选中 {} 项", selections.len()));
    Ok(())
}
