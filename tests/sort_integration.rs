use std::cmp::Ordering;

use format_selector::{
    Comparator, FormatRecord, FormatSelector, SelectError, SelectorOptions, SortOptions,
};

fn combined(id: &str, ext: &str, vcodec: &str) -> FormatRecord {
    FormatRecord {
        format_id: id.to_string(),
        ext: Some(ext.to_string()),
        vcodec: Some(vcodec.to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        ..Default::default()
    }
}

fn all_ids(pool: &[FormatRecord], sort: SortOptions) -> Vec<String> {
    let options = SelectorOptions {
        sort,
        ..Default::default()
    };
    FormatSelector::new("all", options)
        .unwrap()
        .select(pool)
        .unwrap()
        .into_iter()
        .map(|s| s.record.format_id)
        .collect()
}

fn sort_fields(fields: &[&str]) -> SortOptions {
    SortOptions {
        fields: fields.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_default_chain_uses_tbr_before_height() {
    let mut a = combined("a", "mp4", "avc1.64001f");
    a.tbr = Some(1000.0);
    a.height = Some(1080);
    let mut b = combined("b", "mp4", "avc1.64001f");
    b.tbr = Some(2000.0);
    b.height = Some(720);
    let pool = vec![a, b];

    // 默认键链里 tbr 在 height 之前
    assert_eq!(all_ids(&pool, SortOptions::default()), ["b", "a"]);
    // 用户把 height 提到最前面后结论反转
    assert_eq!(all_ids(&pool, sort_fields(&["height"])), ["a", "b"]);
}

#[test]
fn test_minus_prefix_reverses_direction() {
    let mut a = combined("a", "mp4", "avc1.64001f");
    a.height = Some(1080);
    let mut b = combined("b", "mp4", "avc1.64001f");
    b.height = Some(720);
    let pool = vec![a, b];

    assert_eq!(all_ids(&pool, sort_fields(&["height"])), ["a", "b"]);
    assert_eq!(all_ids(&pool, sort_fields(&["-height"])), ["b", "a"]);
    // "+" 前缀是显式的默认方向
    assert_eq!(all_ids(&pool, sort_fields(&["+height"])), ["a", "b"]);
}

#[test]
fn test_unknown_sort_field_fails_before_evaluation() {
    let err = FormatSelector::new(
        "best",
        SelectorOptions {
            sort: sort_fields(&["no-such-field"]),
            ..Default::default()
        },
    )
    .unwrap_err();
    match err {
        SelectError::Sort(inner) => {
            // 错误信息里要能看到用户写的原始 token
            assert!(inner.to_string().contains("no-such-field"));
        }
        other => panic!("期望排序错误，实际: {:?}", other),
    }
}

#[test]
fn test_codec_family_ranking() {
    let pool = vec![
        combined("vp8", "mp4", "vp8.0"),
        combined("avc", "mp4", "avc1.640028"),
        combined("av1", "mp4", "av01.0.08M.08"),
        combined("hevc", "mp4", "hev1.1.6.L93.B0"),
        combined("vp9", "mp4", "vp9"),
    ];
    // 其余键全部相等，由编码家族排名决定顺序
    assert_eq!(
        all_ids(&pool, SortOptions::default()),
        ["av1", "vp9", "hevc", "avc", "vp8"]
    );
}

#[test]
fn test_profile_refines_within_family() {
    let pool = vec![
        combined("main", "mp4", "hev1.1.6.L93"),
        combined("main10", "mp4", "hev1.2.4.L120"),
    ];
    // 同为 hevc 家族，档次高的排前面；家族排名始终优先于档次
    assert_eq!(all_ids(&pool, SortOptions::default()), ["main10", "main"]);
}

#[test]
fn test_vcodec_argument_inserts_match_key() {
    let pool = vec![
        combined("avc", "mp4", "avc1.64001f"),
        combined("vp92", "mp4", "vp09.02.51.10"),
        combined("av1", "mp4", "av01.0.05M.08"),
    ];
    // 默认按家族：av1 最优
    assert_eq!(
        all_ids(&pool, SortOptions::default()),
        ["av1", "vp92", "avc"]
    );
    // vcodec:vp9.2 把"命中 vp9.2"插到用户位置，家族排名只作并列时的兜底
    assert_eq!(
        all_ids(&pool, sort_fields(&["vcodec:vp9.2"])),
        ["vp92", "av1", "avc"]
    );
}

#[test]
fn test_prefer_free_formats_switches_ext_tables() {
    let webm = combined("webm", "webm", "vp9");
    let mp4 = combined("mp4", "mp4", "avc1.64001f");
    let pool = vec![webm, mp4];

    // vp9 在编码家族上压过 avc，把 vext 提到最前让容器决定胜负
    let default_order = all_ids(&pool, sort_fields(&["vext"]));
    assert_eq!(default_order, ["mp4", "webm"]);

    let free = SortOptions {
        fields: vec!["vext".to_string()],
        prefer_free_formats: true,
    };
    assert_eq!(all_ids(&pool, free), ["webm", "mp4"]);
}

#[test]
fn test_unknown_value_sorts_below_any_known() {
    let mut known = combined("known", "mp4", "avc1.64001f");
    known.quality = Some(-10.0);
    let unknown = combined("unknown", "mp4", "avc1.64001f");
    let pool = vec![unknown, known];

    // 已知的负值也比缺失强
    assert_eq!(all_ids(&pool, sort_fields(&["quality"])), ["known", "unknown"]);
}

#[test]
fn test_field_aliases() {
    let mut stereo = combined("stereo", "mp4", "avc1.64001f");
    stereo.audio_channels = Some(2);
    let mut surround = combined("surround", "mp4", "avc1.64001f");
    surround.audio_channels = Some(6);
    let pool = vec![stereo, surround];

    assert_eq!(
        all_ids(&pool, sort_fields(&["audio_channels"])),
        ["surround", "stereo"]
    );
    assert_eq!(
        all_ids(&pool, sort_fields(&["channels"])),
        ["surround", "stereo"]
    );
}

#[test]
fn test_combined_ext_alias_expands() {
    // "ext" 展开为 vext + aext，两条记录只在容器上有差别
    let webm = combined("webm", "webm", "vp9");
    let mp4 = combined("mp4", "mp4", "vp9");
    let pool = vec![webm, mp4];
    assert_eq!(all_ids(&pool, sort_fields(&["ext"])), ["mp4", "webm"]);
}

#[test]
fn test_comparator_ties_are_stable() {
    let x = combined("x", "mp4", "avc1.64001f");
    let y = combined("y", "mp4", "avc1.64001f");

    let comparator = Comparator::build(&SortOptions::default()).unwrap();
    assert_eq!(comparator.compare(&x, &y), Ordering::Equal);

    // 完全并列时保持目录原有顺序
    let pool = vec![x, y];
    assert_eq!(all_ids(&pool, SortOptions::default()), ["x", "y"]);
}

#[test]
fn test_describe_lists_effective_chain() {
    let comparator = Comparator::build(&sort_fields(&["vcodec:vp9.2", "-abr"])).unwrap();
    let described = comparator.describe();
    // 用户键在前，默认键链补在后面；vcodec 的家族兜底紧随命中键
    assert!(described.starts_with("vcodec:vp9.2, vcodec, -abr"));
    assert!(described.contains("hasvid"));
    assert!(described.ends_with("size"));
}
