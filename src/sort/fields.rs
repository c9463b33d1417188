use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::common::models::FormatRecord;

use super::codec;

/// 排序键从一条格式记录里提取出的可比较值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue {
    /// 缺失值，排在任何已知值之后
    Unknown,
    Bool(bool),
    Num(f64),
    Rank(i64),
    /// (编码家族排名, 家族内档次)，家族优先
    Codec(i64, f64),
}

impl SortValue {
    fn kind_order(self) -> u8 {
        match self {
            SortValue::Unknown => 0,
            SortValue::Bool(_) => 1,
            SortValue::Rank(_) => 2,
            SortValue::Codec(..) => 3,
            SortValue::Num(_) => 4,
        }
    }
}

/// 值比较：越大越好；Unknown 严格小于任何已知值
pub fn cmp_values(a: SortValue, b: SortValue) -> Ordering {
    use SortValue::*;
    match (a, b) {
        (Unknown, Unknown) => Ordering::Equal,
        (Unknown, _) => Ordering::Less,
        (_, Unknown) => Ordering::Greater,
        (Bool(x), Bool(y)) => x.cmp(&y),
        (Num(x), Num(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Rank(x), Rank(y)) => x.cmp(&y),
        (Codec(fx, px), Codec(fy, py)) => fx
            .cmp(&fy)
            .then(px.partial_cmp(&py).unwrap_or(Ordering::Equal)),
        // 同一个键的取值种类总是一致的，这个分支只为保证全序
        _ => a.kind_order().cmp(&b.kind_order()),
    }
}

// -----------------------------------------------------------------------------------------------

/// 提取函数签名：(记录, 是否偏好自由格式) -> 可比较值
pub type ExtractFn = fn(&FormatRecord, bool) -> SortValue;

/// 注册表条目
pub enum FieldDef {
    /// 单值字段
    Value(ExtractFn),
    /// 复合字段，展开成若干子字段
    Combined(&'static [&'static str]),
    /// 别名
    Alias(&'static str),
}

/// 默认排序键链，从左到右依次比较
pub const DEFAULT_CHAIN: &[&str] = &[
    "hasvid", "preference", "lang", "quality", "tbr", "filesize", "vbr", "height", "width",
    "proto", "vext", "aext", "abr", "fps", "filesize_approx", "source", "codec", "size",
];

fn num_u32(v: Option<u32>) -> SortValue {
    v.map(|x| SortValue::Num(x as f64)).unwrap_or(SortValue::Unknown)
}

fn num_u64(v: Option<u64>) -> SortValue {
    v.map(|x| SortValue::Num(x as f64)).unwrap_or(SortValue::Unknown)
}

fn num_i32(v: Option<i32>) -> SortValue {
    v.map(|x| SortValue::Num(x as f64)).unwrap_or(SortValue::Unknown)
}

fn num_f64(v: Option<f64>) -> SortValue {
    v.map(SortValue::Num).unwrap_or(SortValue::Unknown)
}

// 协议排序表：https/ftps 最优，可疑或分片协议靠后
const PROTO_ORDER: &[&str] = &[
    "(ht|f)tps",
    "(ht|f)tp$",
    "m3u8.*",
    ".*dash",
    "websocket_frag",
    "rtmpe?",
    "",
    "mms|rtsp",
    "ws|websocket",
    "f4",
];
const PROTO_EMPTY_POS: usize = 6;

lazy_static! {
    static ref PROTO_RES: Vec<Option<Regex>> = PROTO_ORDER
        .iter()
        .map(|pat| {
            if pat.is_empty() {
                None
            } else {
                Some(Regex::new(&format!("^(?:{})", pat)).unwrap())
            }
        })
        .collect();
}

fn proto_rank(protocol: Option<&str>) -> SortValue {
    let len = PROTO_ORDER.len() as i64;
    let Some(proto) = protocol else {
        return SortValue::Rank(len - PROTO_EMPTY_POS as i64);
    };
    let proto = proto.to_ascii_lowercase();
    for (i, re) in PROTO_RES.iter().enumerate() {
        if let Some(re) = re {
            if re.is_match(&proto) {
                return SortValue::Rank(len - i as i64);
            }
        }
    }
    SortValue::Rank(len - PROTO_EMPTY_POS as i64)
}

// 扩展名排序表；free 变体把开放格式排在前面
type ExtTable = &'static [&'static [&'static str]];

const VEXT_ORDER: ExtTable = &[&["mp4"], &["mov"], &["webm"], &["flv"], &[], &["none"]];
const VEXT_ORDER_FREE: ExtTable = &[&["webm"], &["mp4"], &["mov"], &["flv"], &[], &["none"]];
const AEXT_ORDER: ExtTable = &[
    &["m4a"],
    &["aac"],
    &["mp3"],
    &["ogg"],
    &["opus"],
    &["webm", "weba"],
    &[],
    &["none"],
];
const AEXT_ORDER_FREE: ExtTable = &[
    &["ogg"],
    &["opus"],
    &["webm", "weba"],
    &["mp3"],
    &["m4a"],
    &["aac"],
    &[],
    &["none"],
];

fn ext_rank(table: ExtTable, value: &str) -> SortValue {
    let len = table.len() as i64;
    let mut empty_pos = len - 2;
    for (i, names) in table.iter().enumerate() {
        if names.is_empty() {
            empty_pos = i as i64;
        } else if names.contains(&value) {
            return SortValue::Rank(len - i as i64);
        }
    }
    SortValue::Rank(len - empty_pos)
}

fn vext(r: &FormatRecord, free: bool) -> SortValue {
    ext_rank(if free { VEXT_ORDER_FREE } else { VEXT_ORDER }, r.video_ext())
}

fn aext(r: &FormatRecord, free: bool) -> SortValue {
    ext_rank(if free { AEXT_ORDER_FREE } else { AEXT_ORDER }, r.audio_ext())
}

fn res(r: &FormatRecord, _free: bool) -> SortValue {
    match (r.width, r.height) {
        (Some(w), Some(h)) => SortValue::Num(w.min(h) as f64),
        (Some(w), None) => SortValue::Num(w as f64),
        (None, Some(h)) => SortValue::Num(h as f64),
        (None, None) => SortValue::Unknown,
    }
}

lazy_static! {
    /// 字段名 -> 注册表条目的静态映射，比较器构建时查询一次
    pub static ref FIELDS: HashMap<&'static str, FieldDef> = {
        use FieldDef::*;
        let mut m: HashMap<&'static str, FieldDef> = HashMap::new();
        m.insert("hasvid", Value(|r, _| SortValue::Bool(r.has_video())));
        m.insert("hasaud", Value(|r, _| SortValue::Bool(r.has_audio())));
        m.insert("preference", Value(|r, _| num_i32(r.preference)));
        m.insert("lang", Value(|r, _| num_i32(r.language_preference)));
        m.insert("quality", Value(|r, _| num_f64(r.quality)));
        m.insert("source", Value(|r, _| num_i32(r.source_preference)));
        m.insert("tbr", Value(|r, _| num_f64(r.tbr)));
        m.insert("vbr", Value(|r, _| num_f64(r.vbr)));
        m.insert("abr", Value(|r, _| num_f64(r.abr)));
        m.insert("br", Value(|r, _| num_f64(r.tbr.or(r.vbr).or(r.abr))));
        m.insert("asr", Value(|r, _| num_u32(r.asr)));
        m.insert("fps", Value(|r, _| num_f64(r.fps)));
        m.insert("channels", Value(|r, _| num_u32(r.audio_channels)));
        m.insert("height", Value(|r, _| num_u32(r.height)));
        m.insert("width", Value(|r, _| num_u32(r.width)));
        m.insert("res", Value(res));
        m.insert("filesize", Value(|r, _| num_u64(r.filesize)));
        m.insert("filesize_approx", Value(|r, _| num_u64(r.filesize_approx)));
        m.insert("size", Value(|r, _| num_u64(r.filesize.or(r.filesize_approx))));
        m.insert("proto", Value(|r, _| proto_rank(r.protocol.as_deref())));
        m.insert("vext", Value(vext));
        m.insert("aext", Value(aext));
        m.insert("vcodec", Value(|r, _| {
            let (family, profile) = codec::video_codec_rank(r.vcodec.as_deref());
            SortValue::Codec(family, profile)
        }));
        m.insert("acodec", Value(|r, _| {
            let (family, profile) = codec::audio_codec_rank(r.acodec.as_deref());
            SortValue::Codec(family, profile)
        }));
        m.insert("ext", Combined(&["vext", "aext"]));
        m.insert("codec", Combined(&["vcodec", "acodec"]));
        m.insert("language_preference", Alias("lang"));
        m.insert("source_preference", Alias("source"));
        m.insert("audio_channels", Alias("channels"));
        m.insert("protocol", Alias("proto"));
        m
    };
}
