use format_selector::{
    FormatRecord, FormatSelector, SelectError, SelectedFormat, SelectorOptions,
};

fn base_fmt(id: &str) -> FormatRecord {
    FormatRecord {
        format_id: id.to_string(),
        ..Default::default()
    }
}

fn pref_fmt(id: &str, ext: &str, preference: i32) -> FormatRecord {
    FormatRecord {
        ext: Some(ext.to_string()),
        preference: Some(preference),
        ..base_fmt(id)
    }
}

fn video_only(id: &str, ext: &str, vcodec: &str, height: u32) -> FormatRecord {
    FormatRecord {
        ext: Some(ext.to_string()),
        vcodec: Some(vcodec.to_string()),
        acodec: Some("none".to_string()),
        height: Some(height),
        ..base_fmt(id)
    }
}

fn audio_only(id: &str, ext: &str, acodec: &str, abr: f64) -> FormatRecord {
    FormatRecord {
        ext: Some(ext.to_string()),
        vcodec: Some("none".to_string()),
        acodec: Some(acodec.to_string()),
        abr: Some(abr),
        ..base_fmt(id)
    }
}

fn combined(id: &str, ext: &str, vcodec: &str, acodec: &str, height: u32) -> FormatRecord {
    FormatRecord {
        ext: Some(ext.to_string()),
        vcodec: Some(vcodec.to_string()),
        acodec: Some(acodec.to_string()),
        height: Some(height),
        ..base_fmt(id)
    }
}

// preference 依次为 0..=4 的目录
fn preference_pool() -> Vec<FormatRecord> {
    vec![
        pref_fmt("35", "mp4", 0),
        pref_fmt("example-with-dashes", "webm", 1),
        pref_fmt("45", "webm", 2),
        pref_fmt("47", "webm", 3),
        pref_fmt("2", "flv", 4),
    ]
}

fn select(expr: &str, pool: &[FormatRecord]) -> Result<Vec<SelectedFormat>, SelectError> {
    FormatSelector::new(expr, SelectorOptions::default())?.select(pool)
}

fn select_ids(expr: &str, pool: &[FormatRecord]) -> Vec<String> {
    select(expr, pool)
        .unwrap()
        .into_iter()
        .map(|s| s.record.format_id)
        .collect()
}

#[test]
fn test_determinism() {
    let pool = preference_pool();
    // 同一表达式在同一目录上反复求值，结果必须完全一致
    let first = select_ids("all", &pool);
    for _ in 0..5 {
        assert_eq!(select_ids("all", &pool), first);
    }
}

#[test]
fn test_explicit_id() {
    let pool = preference_pool();
    assert_eq!(select_ids("example-with-dashes", &pool), ["example-with-dashes"]);
    assert_eq!(select_ids("35", &pool), ["35"]);
}

#[test]
fn test_alternative_takes_first_nonempty() {
    let pool = preference_pool();
    assert_eq!(select_ids("20/47", &pool), ["47"]);
    assert_eq!(select_ids("20/71/worst", &pool), ["35"]);
}

#[test]
fn test_extension_atoms() {
    let pool = preference_pool();
    assert_eq!(select_ids("webm/mp4", &pool), ["47"]);
    assert_eq!(select_ids("3gp/40/mp4", &pool), ["35"]);
}

#[test]
fn test_all_returns_best_first_permutation() {
    let pool = preference_pool();
    let ids = select_ids("all", &pool);
    assert_eq!(ids, ["2", "47", "45", "example-with-dashes", "35"]);
    assert_eq!(ids.len(), pool.len());
}

#[test]
fn test_mergeall_combines_everything() {
    let pool = preference_pool();
    let picked = select("mergeall", &pool).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].record.format_id, "2+47+45+example-with-dashes+35");
    assert_eq!(picked[0].requested_formats.len(), 5);
}

#[test]
fn test_single_combined_degenerate_pool() {
    // 只有一个完整格式时，各个保留字都只能选它
    let pool = vec![combined("only", "mp4", "avc1.64001f", "mp4a.40.2", 720)];
    for expr in ["best", "worst", "bestvideo", "bestaudio", "worstvideo", "worstaudio"] {
        assert_eq!(select_ids(expr, &pool), ["only"], "表达式 {} 选择有误", expr);
    }
}

#[test]
fn test_best_falls_back_without_combined() {
    // 目录里只有纯视频和纯音频时，best 不允许落空
    let pool = vec![
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
        video_only("v", "mp4", "avc1.64001f", 1080),
    ];
    // hasvid 是第一排序键，带视频的一侧胜出
    assert_eq!(select_ids("best", &pool), ["v"]);
    assert_eq!(select_ids("worst", &pool), ["a"]);
}

#[test]
fn test_best_prefers_combined_over_better_parts() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 2160),
        combined("c", "mp4", "avc1.64001f", "mp4a.40.2", 360),
        audio_only("a", "m4a", "mp4a.40.2", 320.0),
    ];
    // 有完整格式时 best 只在完整格式里挑
    assert_eq!(select_ids("best", &pool), ["c"]);
}

#[test]
fn test_stream_restricted_keywords() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
        combined("c", "mp4", "avc1.64001f", "mp4a.40.2", 720),
    ];
    // bestvideo 在带视频的记录里挑（纯视频 ∪ 完整），不会选纯音频
    let bv = select_ids("bestvideo", &pool);
    assert_ne!(bv, ["a"]);
    let ba = select_ids("bestaudio", &pool);
    assert_ne!(ba, ["v"]);
}

#[test]
fn test_storyboard_never_selected_by_best() {
    let mut storyboard = base_fmt("sb");
    storyboard.vcodec = Some("none".to_string());
    storyboard.acodec = Some("none".to_string());
    let pool = vec![storyboard, video_only("v", "mp4", "avc1.64001f", 720)];
    assert_eq!(select_ids("best", &pool), ["v"]);
    assert_eq!(select_ids("worst", &pool), ["v"]);
}

#[test]
fn test_filter_idempotence() {
    let pool = preference_pool();
    assert_eq!(
        select_ids("all[ext=webm]", &pool),
        select_ids("all[ext=webm][ext=webm]", &pool)
    );
}

#[test]
fn test_string_operator_complementarity() {
    let mut zh = combined("zh", "mp4", "avc1.64001f", "mp4a.40.2", 720);
    zh.language = Some("zh-CN".to_string());
    let pool = vec![zh];

    // 字段存在时，= 与 != 恰好互补
    assert_eq!(select_ids("best[language=zh-CN]", &pool), ["zh"]);
    assert!(matches!(
        select("best[language!=zh-CN]", &pool),
        Err(SelectError::NoMatch(_))
    ));

    // 字段缺失时，两个严格形式都不放行
    let missing = vec![combined("x", "mp4", "avc1.64001f", "mp4a.40.2", 720)];
    assert!(matches!(
        select("best[language=zh-CN]", &missing),
        Err(SelectError::NoMatch(_))
    ));
    assert!(matches!(
        select("best[language!=zh-CN]", &missing),
        Err(SelectError::NoMatch(_))
    ));
    // 宽松形式对缺失字段放行
    assert_eq!(select_ids("best[language=?zh-CN]", &missing), ["x"]);
}

#[test]
fn test_lenient_numeric_on_missing_field() {
    // 没有 tbr 的记录：严格比较拦下，宽松比较放行
    let pool = vec![combined("x", "mp4", "avc1.64001f", "mp4a.40.2", 720)];
    assert!(matches!(
        select("best[tbr<1000]", &pool),
        Err(SelectError::NoMatch(_))
    ));
    assert_eq!(select_ids("best[tbr<?1000]", &pool), ["x"]);
}

#[test]
fn test_size_literal_normalization() {
    let mut small = combined("E", "mp4", "avc1.64001f", "mp4a.40.2", 360);
    small.filesize = Some(3000);
    let mut large = combined("G", "mp4", "avc1.64001f", "mp4a.40.2", 360);
    large.filesize = Some(1_000_000);
    let pool = vec![small, large];

    // 1M 是十进制 10^6，1MiB 是二进制 2^20
    assert_eq!(select_ids("best[filesize<1M]", &pool), ["E"]);
    assert_eq!(select_ids("best[filesize<1MiB]", &pool), ["G"]);
}

#[test]
fn test_merge_builds_composite() {
    let pool = vec![
        video_only("137", "mp4", "avc1.64001f", 1080),
        audio_only("140", "m4a", "mp4a.40.2", 128.0),
    ];
    let picked = select("bestvideo+bestaudio", &pool).unwrap();
    assert_eq!(picked.len(), 1);
    let merged = &picked[0];
    assert_eq!(merged.record.format_id, "137+140");
    assert!(merged.is_composite());
    assert_eq!(merged.requested_formats[0].format_id, "137");
    assert_eq!(merged.requested_formats[1].format_id, "140");
    // avc1 + mp4a 都在 mp4 的编码兼容表里
    assert_eq!(merged.record.ext.as_deref(), Some("mp4"));
    // 唯一视频/音频来源的流参数被继承
    assert_eq!(merged.record.height, Some(1080));
    assert_eq!(merged.record.abr, Some(128.0));
}

#[test]
fn test_merge_incompatible_codecs_goes_mkv() {
    let pool = vec![
        video_only("v", "webm", "vp9", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
    ];
    let picked = select("bestvideo+bestaudio", &pool).unwrap();
    assert_eq!(picked[0].record.ext.as_deref(), Some("mkv"));
}

#[test]
fn test_merge_empty_side_propagates_to_alternative() {
    // 目录里没有音频：合并整体落空，备选项必须接手，不允许只给一半流
    let pool = vec![video_only("v", "mp4", "avc1.64001f", 1080)];
    let picked = select("bestvideo+bestaudio/best", &pool).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].record.format_id, "v");
    assert!(!picked[0].is_composite());
}

#[test]
fn test_comma_group_yields_multiple_outputs() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
    ];
    let ids = select_ids("bestvideo/best,bestaudio", &pool);
    assert_eq!(ids, ["v", "a"]);
}

#[test]
fn test_filters_on_parenthesized_group() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
    ];
    // 过滤器先把池收窄到 m4a，再在里面跑备选链
    let ids = select_ids("(bestvideo/bestaudio)[ext=m4a]", &pool);
    assert_eq!(ids, ["a"]);
}

#[test]
fn test_bare_filter_implies_best() {
    let pool = vec![
        combined("hd", "mp4", "avc1.64001f", "mp4a.40.2", 1080),
        combined("sd", "mp4", "avc1.64001f", "mp4a.40.2", 480),
    ];
    assert_eq!(select_ids("[height<=720]", &pool), ["sd"]);
}

#[test]
fn test_capability_error_is_distinct() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
    ];
    let options = SelectorOptions {
        allow_merge: false,
        ..Default::default()
    };

    let err = FormatSelector::new("bestvideo+bestaudio", options.clone())
        .unwrap()
        .select(&pool)
        .unwrap_err();
    assert!(matches!(err, SelectError::MergeUnsupported));

    let err = FormatSelector::new("mergeall", options)
        .unwrap()
        .select(&pool)
        .unwrap_err();
    assert!(matches!(err, SelectError::MergeUnsupported));
}

#[test]
fn test_no_match_carries_expression() {
    let pool = preference_pool();
    match select("does-not-exist", &pool) {
        Err(SelectError::NoMatch(expr)) => assert_eq!(expr, "does-not-exist"),
        other => panic!("期望无匹配错误，实际: {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_syntax_errors_reported_before_evaluation() {
    let bad = [
        "best[",
        "best]",
        "(best",
        "best)",
        "best+",
        "+best",
        "best//worst",
        "best,,worst",
        "()",
        "best[]",
        "best[foo=bar]",
        "best[height<>3]",
        "(best,bestaudio)+bestvideo",
        "bestvideo+(best,bestaudio)",
        "(best,bestaudio)/bestvideo",
    ];
    for expr in bad {
        let result = FormatSelector::new(expr, SelectorOptions::default());
        assert!(
            matches!(result, Err(SelectError::Syntax { .. })),
            "表达式 {:?} 应当解析失败",
            expr
        );
    }
}

#[test]
fn test_composite_component_reference() {
    // 合成记录的分量 id 也能被显式 id 命中
    let mut merged = base_fmt("137+140");
    merged.vcodec = Some("avc1.64001f".to_string());
    merged.acodec = Some("mp4a.40.2".to_string());
    let pool = vec![merged];
    assert_eq!(select_ids("137", &pool), ["137+140"]);
}

#[test]
fn test_parenthesized_group_at_top_level() {
    let pool = vec![
        video_only("v", "mp4", "avc1.64001f", 1080),
        audio_only("a", "m4a", "mp4a.40.2", 128.0),
    ];
    let ids = select_ids("(bestvideo,bestaudio)", &pool);
    assert_eq!(ids, ["v", "a"]);
}
