use itertools::Itertools;
use tracing::debug;

use crate::common::models::{FormatRecord, SelectedFormat};
use crate::sort::Comparator;

use super::errors::SelectError;
use super::filter::FilterClause;
use super::merger::{self, MergeOptions};
use super::models::{Selector, SelectorKind, is_video_ext};

/// 求值上下文：池和比较器全程只读共享，各分支只产生自己的引用列表，
/// 因此 "+" 两侧永远看不到对方的筛选残留
pub struct EvalContext<'a> {
    pub pool: &'a [FormatRecord],
    pub comparator: &'a Comparator,
    pub allow_merge: bool,
    pub merge_options: MergeOptions,
}

/// 执行已解析的表达式；空结果合法并向外传播，由顶层决定是否报错
pub fn evaluate(selector: &Selector, ctx: &EvalContext) -> Result<Vec<SelectedFormat>, SelectError> {
    let pool: Vec<&FormatRecord> = ctx.pool.iter().collect();
    eval(selector, &pool, ctx)
}

fn apply_filters<'a>(pool: &[&'a FormatRecord], filters: &[FilterClause]) -> Vec<&'a FormatRecord> {
    pool.iter()
        .copied()
        .filter(|r| filters.iter().all(|c| c.matches(r)))
        .collect()
}

fn eval<'a>(
    selector: &Selector,
    pool: &[&'a FormatRecord],
    ctx: &EvalContext<'a>,
) -> Result<Vec<SelectedFormat>, SelectError> {
    match selector {
        Selector::Single { kind, filters } => {
            let filtered = apply_filters(pool, filters);
            eval_single(kind, filtered, ctx)
        }
        Selector::Filtered { inner, filters } => {
            // 先收窄池，再对内部表达式整体求值
            let narrowed = apply_filters(pool, filters);
            eval(inner, &narrowed, ctx)
        }
        Selector::Merge(left, right) => {
            // 显式要求合并但环境不支持：按能力错误上报，绝不悄悄降级
            if !ctx.allow_merge {
                return Err(SelectError::MergeUnsupported);
            }
            let left_picked = eval(left, pool, ctx)?;
            if left_picked.is_empty() {
                return Ok(Vec::new());
            }
            let right_picked = eval(right, pool, ctx)?;
            if right_picked.is_empty() {
                return Ok(Vec::new());
            }
            Ok(left_picked
                .iter()
                .cartesian_product(right_picked.iter())
                .map(|(l, r)| merger::merge_pair(l, r, &ctx.merge_options))
                .collect())
        }
        Selector::PickFirst(options) => {
            for option in options {
                let picked = eval(option, pool, ctx)?;
                if !picked.is_empty() {
                    return Ok(picked);
                }
            }
            Ok(Vec::new())
        }
        Selector::Group(items) => {
            let mut all = Vec::new();
            for item in items {
                all.extend(eval(item, pool, ctx)?);
            }
            Ok(all)
        }
    }
}

fn single(record: &FormatRecord) -> SelectedFormat {
    SelectedFormat::single(record.clone())
}

fn eval_single<'a>(
    kind: &SelectorKind,
    filtered: Vec<&'a FormatRecord>,
    ctx: &EvalContext<'a>,
) -> Result<Vec<SelectedFormat>, SelectError> {
    let picked = match kind {
        SelectorKind::FormatId(id) => filtered
            .iter()
            .copied()
            .find(|r| {
                // 也允许命中此前合成的 "137+140" 这类组合 id 的分量
                r.format_id == *id || r.format_id.split('+').any(|part| part == id)
            })
            .map(|r| vec![single(r)])
            .unwrap_or_default(),

        SelectorKind::Best | SelectorKind::Worst => {
            let candidates: Vec<&FormatRecord> = filtered
                .iter()
                .copied()
                .filter(|r| !r.is_storyboard())
                .collect();
            let combined: Vec<&FormatRecord> = candidates
                .iter()
                .copied()
                .filter(|r| r.is_combined())
                .collect();
            // 有完整格式就只在完整格式里挑；纯音频/纯视频目录退回整个筛选池
            let pick_from = if combined.is_empty() { candidates } else { combined };
            let choice = if matches!(kind, SelectorKind::Best) {
                ctx.comparator.best(pick_from)
            } else {
                ctx.comparator.worst(pick_from)
            };
            choice.map(|r| vec![single(r)]).unwrap_or_default()
        }

        SelectorKind::BestVideo | SelectorKind::WorstVideo => {
            let candidates = filtered.iter().copied().filter(|r| r.has_video());
            let choice = if matches!(kind, SelectorKind::BestVideo) {
                ctx.comparator.best(candidates)
            } else {
                ctx.comparator.worst(candidates)
            };
            choice.map(|r| vec![single(r)]).unwrap_or_default()
        }

        SelectorKind::BestAudio | SelectorKind::WorstAudio => {
            let candidates = filtered.iter().copied().filter(|r| r.has_audio());
            let choice = if matches!(kind, SelectorKind::BestAudio) {
                ctx.comparator.best(candidates)
            } else {
                ctx.comparator.worst(candidates)
            };
            choice.map(|r| vec![single(r)]).unwrap_or_default()
        }

        SelectorKind::All => {
            let mut refs = filtered;
            ctx.comparator.sort_best_first(&mut refs);
            refs.into_iter().map(single).collect()
        }

        SelectorKind::MergeAll => {
            if !ctx.allow_merge {
                return Err(SelectError::MergeUnsupported);
            }
            let mut components: Vec<&FormatRecord> = filtered
                .iter()
                .copied()
                .filter(|r| !r.is_storyboard())
                .collect();
            ctx.comparator.sort_best_first(&mut components);
            let selections: Vec<SelectedFormat> = components.into_iter().map(single).collect();
            merger::merge_all(selections, &ctx.merge_options)
                .map(|m| vec![m])
                .unwrap_or_default()
        }

        SelectorKind::Extension(ext) => {
            let choice = if is_video_ext(ext) {
                let combined: Vec<&FormatRecord> = filtered
                    .iter()
                    .copied()
                    .filter(|r| r.ext.as_deref() == Some(ext.as_str()) && r.is_combined())
                    .collect();
                if combined.is_empty() && !ctx.pool.iter().any(|r| r.is_combined()) {
                    // 整个目录都没有完整格式时，退回该容器下任何带视频的记录
                    ctx.comparator.best(
                        filtered
                            .iter()
                            .copied()
                            .filter(|r| r.ext.as_deref() == Some(ext.as_str()) && r.has_video()),
                    )
                } else {
                    ctx.comparator.best(combined)
                }
            } else {
                ctx.comparator.best(
                    filtered
                        .iter()
                        .copied()
                        .filter(|r| r.ext.as_deref() == Some(ext.as_str()) && r.has_audio()),
                )
            };
            choice.map(|r| vec![single(r)]).unwrap_or_default()
        }
    };

    debug!("选择原子 {:?} 命中 {} 条", kind, picked.len());
    Ok(picked)
}
