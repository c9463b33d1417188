use colored::*;

use super::models::{FormatRecord, SelectedFormat};

/// 漂亮的终端输出工具
pub struct PrettyLogger;

impl PrettyLogger {
    /// 显示成功消息
    pub fn success(message: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), message.as_ref());
    }

    /// 显示信息消息
    pub fn info(message: impl AsRef<str>) {
        println!("{} {}", "ℹ".blue().bold(), message.as_ref());
    }

    /// 显示错误消息
    pub fn error(message: impl AsRef<str>) {
        println!("{} {}", "✗".red().bold(), message.as_ref());
    }

    /// 显示分割线
    pub fn separator() {
        println!("{}", "─".repeat(50).bright_black());
    }

    /// 显示标题
    pub fn title(text: impl AsRef<str>) {
        let text = text.as_ref();
        let padding = (48usize.saturating_sub(text.len())) / 2;
        let right = 48usize.saturating_sub(padding + text.len());
        println!(
            "{} {} {}",
            "─".repeat(padding).bright_black(),
            text.bold(),
            "─".repeat(right).bright_black()
        );
    }

    /// 显示格式目录里的一行
    pub fn format_row(record: &FormatRecord) {
        let kind = if record.is_combined() {
            "音视频".cyan()
        } else if record.is_video_only() {
            "纯视频".magenta()
        } else if record.is_audio_only() {
            "纯音频".yellow()
        } else {
            "无流".bright_black()
        };
        println!("  {} {}", kind, record);
    }

    /// 显示一条选择结果及其来源格式
    pub fn selection(index: usize, selected: &SelectedFormat) {
        println!(
            "{} {} {}",
            "▶".cyan().bold(),
            format!("#{}", index + 1).bold(),
            selected.record.to_string().green()
        );
        if selected.is_composite() {
            for part in selected.components() {
                println!("    {} {}", "+".bright_black(), part);
            }
        }
    }
}
