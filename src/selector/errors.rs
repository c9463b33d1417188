use thiserror::Error;

use crate::sort::SortError;

/// 格式选择子系统的错误分类：语法错误和能力错误在求值前就会暴露，
/// 无匹配错误只在顶层表达式整体为空时报告一次
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("格式表达式语法错误: {message} (位置 {pos}): {expr}")]
    Syntax {
        expr: String,
        pos: usize,
        message: String,
    },
    #[error("没有符合要求的格式: {0}")]
    NoMatch(String),
    #[error("当前环境不支持合并音视频流，无法满足 \"+\" 或 mergeall 选择")]
    MergeUnsupported,
    #[error("排序配置错误: {0}")]
    Sort(#[from] SortError),
}

impl SelectError {
    /// 语法错误的便捷构造
    pub fn syntax(expr: &str, pos: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            expr: expr.to_string(),
            pos,
            message: message.into(),
        }
    }
}
