use tracing::debug;

use crate::common::models::{FormatRecord, SelectedFormat};
use crate::sort::{Comparator, SortOptions};

pub mod errors;
pub mod evaluator;
pub mod filter;
pub mod merger;
pub mod models;
pub mod parser;
pub mod tokenizer;

use errors::SelectError;
use evaluator::EvalContext;
use merger::MergeOptions;
use models::Selector;

/// 没有显式指定表达式时的默认选择
pub const DEFAULT_EXPR: &str = "bestvideo+bestaudio/best";

/// 选择器配置，来自命令行或调用方
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    pub sort: SortOptions,
    /// 运行环境能否把分离的音视频流混流进一个容器
    pub allow_merge: bool,
    /// 组合结果的容器覆盖，形如 "mp4" 或 "mp4/mkv"
    pub merge_output_format: Option<String>,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            sort: SortOptions::default(),
            allow_merge: true,
            merge_output_format: None,
        }
    }
}

/// 格式选择器：表达式解析一次、比较器构建一次，之后可跨多个格式池复用
#[derive(Debug)]
pub struct FormatSelector {
    expr: String,
    ast: Selector,
    comparator: Comparator,
    options: SelectorOptions,
}

impl FormatSelector {
    /// 解析表达式并构建比较器；语法和排序配置错误在这里就返回，
    /// 不会等到拿着池求值的时候才发现
    pub fn new(expr: &str, options: SelectorOptions) -> Result<Self, SelectError> {
        let ast = parser::parse(expr)?;
        let comparator = Comparator::build(&options.sort)?;
        debug!("格式选择表达式解析完成: {}", expr);
        Ok(Self {
            expr: expr.to_string(),
            ast,
            comparator,
            options,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// 对一个格式池求值，返回有序的选择结果；顶层结果为空按无匹配报错
    pub fn select(&self, formats: &[FormatRecord]) -> Result<Vec<SelectedFormat>, SelectError> {
        let ctx = EvalContext {
            pool: formats,
            comparator: &self.comparator,
            allow_merge: self.options.allow_merge,
            merge_options: MergeOptions {
                output_format: self.options.merge_output_format.clone(),
                prefer_free_formats: self.options.sort.prefer_free_formats,
            },
        };
        let selections = evaluator::evaluate(&self.ast, &ctx)?;
        if selections.is_empty() {
            return Err(SelectError::NoMatch(self.expr.clone()));
        }
        Ok(selections)
    }
}
