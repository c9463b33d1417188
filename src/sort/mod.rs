use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::common::models::FormatRecord;

pub mod codec;
pub mod fields;

use codec::CodecQuery;
use fields::{DEFAULT_CHAIN, FIELDS, FieldDef, cmp_values};

#[derive(Debug, Error)]
pub enum SortError {
    #[error("未知的排序字段: {0}")]
    UnknownField(String),
    #[error("排序字段不支持参数: {0}")]
    UnsupportedArg(String),
}

/// 比较器配置：用户指定的键排在默认键链之前
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// 排序键，形如 "abr"、"-height"、"vcodec:vp9.2"
    pub fields: Vec<String>,
    /// 优先选择自由格式（webm/opus 一类）
    pub prefer_free_formats: bool,
}

#[derive(Debug)]
enum KeyKind {
    Extract(fields::ExtractFn),
    /// `vcodec:X` 插入的"编码命中"布尔键，紧随其后的家族键兜底
    CodecMatch(CodecQuery),
}

#[derive(Debug)]
struct SortKey {
    name: String,
    kind: KeyKind,
    reverse: bool,
}

/// 由默认键链和用户覆盖合成的多键比较器，构建一次后跨记录复用
#[derive(Debug)]
pub struct Comparator {
    keys: Vec<SortKey>,
    prefer_free: bool,
}

/// 单个排序 token：[+|-]name[:arg]
fn parse_token(token: &str) -> (bool, &str, Option<&str>) {
    let (reverse, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    match rest.split_once(':') {
        Some((name, arg)) => (reverse, name, Some(arg)),
        None => (reverse, rest, None),
    }
}

impl Comparator {
    pub fn build(options: &SortOptions) -> Result<Self, SortError> {
        let mut keys: Vec<SortKey> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let user = options.fields.iter().map(|s| s.as_str());
        let defaults = DEFAULT_CHAIN.iter().copied();

        for token in user.chain(defaults) {
            let (reverse, mut name, arg) = parse_token(token);
            if name.is_empty() {
                return Err(SortError::UnknownField(token.to_string()));
            }

            // 解析别名
            loop {
                match FIELDS.get(name) {
                    Some(FieldDef::Alias(target)) => name = *target,
                    Some(_) => break,
                    None => return Err(SortError::UnknownField(token.to_string())),
                }
            }

            if let Some(arg) = arg {
                // 只有编码字段接受参数：先插命中键，再以家族排名兜底
                let query = match name {
                    "vcodec" => CodecQuery::video(arg),
                    "acodec" => CodecQuery::audio(arg),
                    _ => return Err(SortError::UnsupportedArg(token.to_string())),
                };
                if seen.insert(format!("{}:{}", name, arg)) {
                    keys.push(SortKey {
                        name: format!("{}:{}", name, arg),
                        kind: KeyKind::CodecMatch(query),
                        reverse,
                    });
                }
                if let Some(FieldDef::Value(f)) = FIELDS.get(name) {
                    if seen.insert(name.to_string()) {
                        keys.push(SortKey {
                            name: name.to_string(),
                            kind: KeyKind::Extract(*f),
                            reverse,
                        });
                    }
                }
                continue;
            }

            let expanded: &[&str] = match FIELDS.get(name) {
                Some(FieldDef::Combined(subs)) => *subs,
                _ => std::slice::from_ref(&name),
            };
            for sub in expanded {
                // 重复字段保留第一次出现的位置（用户覆盖优先）
                if !seen.insert(sub.to_string()) {
                    continue;
                }
                match FIELDS.get(sub) {
                    Some(FieldDef::Value(f)) => keys.push(SortKey {
                        name: sub.to_string(),
                        kind: KeyKind::Extract(*f),
                        reverse,
                    }),
                    _ => return Err(SortError::UnknownField(token.to_string())),
                }
            }
        }

        let comparator = Self {
            keys,
            prefer_free: options.prefer_free_formats,
        };
        debug!("格式排序键链: {}", comparator.describe());
        Ok(comparator)
    }

    /// 键链的可读描述，按比较顺序排列
    pub fn describe(&self) -> String {
        self.keys
            .iter()
            .map(|k| {
                if k.reverse {
                    format!("-{}", k.name)
                } else {
                    k.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 多键比较：Greater 表示 a 更好；全部相等时返回 Equal（稳定并列）
    pub fn compare(&self, a: &FormatRecord, b: &FormatRecord) -> Ordering {
        for key in &self.keys {
            let ord = match &key.kind {
                KeyKind::Extract(f) => {
                    cmp_values(f(a, self.prefer_free), f(b, self.prefer_free))
                }
                KeyKind::CodecMatch(query) => {
                    query.matches_record(a).cmp(&query.matches_record(b))
                }
            };
            let ord = if key.reverse { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// 并列时保留池中靠前的记录
    pub fn best<'a>(&self, pool: impl IntoIterator<Item = &'a FormatRecord>) -> Option<&'a FormatRecord> {
        let mut iter = pool.into_iter();
        let mut best = iter.next()?;
        for candidate in iter {
            if self.compare(candidate, best) == Ordering::Greater {
                best = candidate;
            }
        }
        Some(best)
    }

    /// 并列时保留池中靠前的记录
    pub fn worst<'a>(&self, pool: impl IntoIterator<Item = &'a FormatRecord>) -> Option<&'a FormatRecord> {
        let mut iter = pool.into_iter();
        let mut worst = iter.next()?;
        for candidate in iter {
            if self.compare(candidate, worst) == Ordering::Less {
                worst = candidate;
            }
        }
        Some(worst)
    }

    /// 稳定降序排列：并列保持池中原有顺序
    pub fn sort_best_first(&self, pool: &mut [&FormatRecord]) {
        pool.sort_by(|a, b| self.compare(b, a));
    }
}
