use lazy_static::lazy_static;
use regex::Regex;

use crate::common::models::FormatRecord;

use super::errors::SelectError;

// 可参与过滤的字段，解析时就校验，未知字段按语法错误处理
const NUM_FIELDS: &[&str] = &[
    "width",
    "height",
    "fps",
    "tbr",
    "vbr",
    "abr",
    "asr",
    "filesize",
    "filesize_approx",
    "audio_channels",
    "quality",
    "preference",
    "language_preference",
    "source_preference",
];
const TEXT_FIELDS: &[&str] = &["format_id", "ext", "vcodec", "acodec", "language", "protocol"];

/// 数值比较操作符
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl NumOp {
    fn apply(self, actual: f64, wanted: f64) -> bool {
        match self {
            Self::Lt => actual < wanted,
            Self::Le => actual <= wanted,
            Self::Gt => actual > wanted,
            Self::Ge => actual >= wanted,
            Self::Eq => actual == wanted,
            Self::Ne => actual != wanted,
        }
    }
}

/// 字符串匹配操作符，配合取反前缀使用
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrOp {
    Eq,
    StartsWith,
    EndsWith,
    Contains,
}

impl StrOp {
    fn apply(self, actual: &str, wanted: &str) -> bool {
        match self {
            Self::Eq => actual == wanted,
            Self::StartsWith => actual.starts_with(wanted),
            Self::EndsWith => actual.ends_with(wanted),
            Self::Contains => actual.contains(wanted),
        }
    }
}

/// 一条过滤子句；方括号组内逗号分隔的多条子句按 AND 处理
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    Numeric {
        field: String,
        op: NumOp,
        value: f64,
        lenient: bool,
    },
    Text {
        field: String,
        op: StrOp,
        value: String,
        negated: bool,
        lenient: bool,
    },
}

// 严格操作符遇到缺失字段：判不匹配
fn strict_miss() -> bool {
    false
}

// 宽松（? 后缀）操作符遇到缺失字段：放行，很多站点填不全数值字段
fn lenient_miss() -> bool {
    true
}

impl FilterClause {
    pub fn matches(&self, record: &FormatRecord) -> bool {
        match self {
            Self::Numeric {
                field,
                op,
                value,
                lenient,
            } => match field_num(record, field) {
                Some(actual) => op.apply(actual, *value),
                None if *lenient => lenient_miss(),
                None => strict_miss(),
            },
            Self::Text {
                field,
                op,
                value,
                negated,
                lenient,
            } => match field_text(record, field) {
                Some(actual) => op.apply(actual, value) != *negated,
                None if *lenient => lenient_miss(),
                None => strict_miss(),
            },
        }
    }
}

fn field_num(record: &FormatRecord, field: &str) -> Option<f64> {
    match field {
        "width" => record.width.map(f64::from),
        "height" => record.height.map(f64::from),
        "fps" => record.fps,
        "tbr" => record.tbr,
        "vbr" => record.vbr,
        "abr" => record.abr,
        "asr" => record.asr.map(f64::from),
        "filesize" => record.filesize.map(|v| v as f64),
        "filesize_approx" => record.filesize_approx.map(|v| v as f64),
        "audio_channels" => record.audio_channels.map(f64::from),
        "quality" => record.quality,
        "preference" => record.preference.map(f64::from),
        "language_preference" => record.language_preference.map(f64::from),
        "source_preference" => record.source_preference.map(f64::from),
        _ => None,
    }
}

fn field_text<'a>(record: &'a FormatRecord, field: &str) -> Option<&'a str> {
    match field {
        "format_id" => Some(record.format_id.as_str()),
        "ext" => record.ext.as_deref(),
        "vcodec" => record.vcodec.as_deref(),
        "acodec" => record.acodec.as_deref(),
        "language" => record.language.as_deref(),
        "protocol" => record.protocol.as_deref(),
        _ => None,
    }
}

// -----------------------------------------------------------------------------------------------

lazy_static! {
    // 子句前缀：字段名、可选取反、操作符、可选宽松标记；值部分单独处理（要支持引号）
    static ref CLAUSE_RE: Regex = Regex::new(
        r"^\s*(?P<key>[a-zA-Z0-9._-]+)\s*(?P<neg>!)?\s*(?P<op>\^=|\$=|\*=|<=|>=|=|<|>)\s*(?P<len>\?)?\s*"
    )
    .unwrap();
    static ref BARE_VALUE_RE: Regex = Regex::new(r"^[\w.-]+$").unwrap();
}

/// 大小字面量：K/M/G/... 可选 i（二进制）可选 B；1M = 10^6，1MiB = 2^20
fn parse_size_literal(value: &str) -> Option<f64> {
    let split = value
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(value.len());
    let (num_part, unit) = value.split_at(split);
    let n: f64 = num_part.parse().ok()?;
    if unit.is_empty() {
        return Some(n);
    }

    let mut chars = unit.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    let exp = "kmgtpezy".find(letter)? as i32 + 1;
    let mut rest: Vec<char> = chars.collect();
    let base = if rest.first().map(|c| c.to_ascii_lowercase()) == Some('i') {
        rest.remove(0);
        1024f64
    } else {
        1000f64
    };
    match rest.as_slice() {
        [] => {}
        [b] if b.to_ascii_lowercase() == 'b' => {}
        _ => return None,
    }
    Some(n * base.powi(exp))
}

/// 引号值：支持 \" 一类的转义，必须恰好消费到结尾
fn parse_quoted_value(raw: &str, quote: char) -> Option<String> {
    let mut value = String::new();
    let mut chars = raw.chars();
    let mut closed = false;
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(e @ ('\\' | '"' | '\'')) => value.push(e),
                Some(e) => {
                    value.push('\\');
                    value.push(e);
                }
                None => return None,
            }
        } else if c == quote {
            closed = true;
            break;
        } else {
            value.push(c);
        }
    }
    if !closed || !chars.as_str().trim().is_empty() {
        return None;
    }
    Some(value)
}

fn parse_clause(clause: &str, expr: &str, pos: usize) -> Result<FilterClause, SelectError> {
    let caps = CLAUSE_RE
        .captures(clause)
        .ok_or_else(|| SelectError::syntax(expr, pos, format!("无法解析的过滤条件 \"{}\"", clause.trim())))?;

    let field = caps.name("key").unwrap().as_str().to_string();
    let negated = caps.name("neg").is_some();
    let op = caps.name("op").unwrap().as_str();
    let lenient = caps.name("len").is_some();
    let raw_value = &clause[caps.get(0).unwrap().end()..];

    let is_numeric_field = NUM_FIELDS.contains(&field.as_str());
    if !is_numeric_field && !TEXT_FIELDS.contains(&field.as_str()) {
        return Err(SelectError::syntax(
            expr,
            pos,
            format!("未知的过滤字段 \"{}\"", field),
        ));
    }

    if is_numeric_field {
        let num_op = match (op, negated) {
            ("<", false) => NumOp::Lt,
            ("<=", false) => NumOp::Le,
            (">", false) => NumOp::Gt,
            (">=", false) => NumOp::Ge,
            ("=", false) => NumOp::Eq,
            ("=", true) => NumOp::Ne,
            _ => {
                return Err(SelectError::syntax(
                    expr,
                    pos,
                    format!("字段 \"{}\" 不支持操作符 \"{}{}\"", field, if negated { "!" } else { "" }, op),
                ));
            }
        };
        let value = parse_size_literal(raw_value.trim()).ok_or_else(|| {
            SelectError::syntax(expr, pos, format!("无效的数值 \"{}\"", raw_value.trim()))
        })?;
        return Ok(FilterClause::Numeric {
            field,
            op: num_op,
            value,
            lenient,
        });
    }

    let str_op = match op {
        "=" => StrOp::Eq,
        "^=" => StrOp::StartsWith,
        "$=" => StrOp::EndsWith,
        "*=" => StrOp::Contains,
        _ => {
            return Err(SelectError::syntax(
                expr,
                pos,
                format!("字段 \"{}\" 不支持操作符 \"{}\"", field, op),
            ));
        }
    };

    let trimmed = raw_value.trim();
    let value = if let Some(stripped) = trimmed.strip_prefix('"') {
        parse_quoted_value(stripped, '"')
    } else if let Some(stripped) = trimmed.strip_prefix('\'') {
        parse_quoted_value(stripped, '\'')
    } else if BARE_VALUE_RE.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
    .ok_or_else(|| SelectError::syntax(expr, pos, format!("无效的过滤值 \"{}\"", trimmed)))?;

    Ok(FilterClause::Text {
        field,
        op: str_op,
        value,
        negated,
        lenient,
    })
}

/// 一个方括号组的内部文本 -> 若干 AND 子句
pub fn parse_filter_body(body: &str, expr: &str, pos: usize) -> Result<Vec<FilterClause>, SelectError> {
    let mut clauses = Vec::new();
    for part in split_clauses(body) {
        if part.trim().is_empty() {
            return Err(SelectError::syntax(expr, pos, "空的过滤条件"));
        }
        clauses.push(parse_clause(part, expr, pos)?);
    }
    if clauses.is_empty() {
        return Err(SelectError::syntax(expr, pos, "空的过滤器"));
    }
    Ok(clauses)
}

// 按顶层逗号切分，引号内的逗号不算分隔符
fn split_clauses(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), _) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ',') => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
