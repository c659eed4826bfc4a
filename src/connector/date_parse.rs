// ==========================================
// NPI 主流程排程系统 - 日期文本解析
// ==========================================
// 职责: 数据源日期/时间文本 → chrono 类型
// 支持: ISO / 斜杠 / 美式 / 紧凑 (YYYYMMDD) 格式,可带时间部分
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// 解析时间戳文本
///
/// # 返回
/// - Ok(None): 空文本（源端 NULL）
/// - Ok(Some(ts)): 解析成功（纯日期按当日 00:00:00）
/// - Err(msg): 非空但无法识别
pub fn parse_timestamp(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(Some(ts));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(date.and_hms_opt(0, 0, 0));
        }
    }

    Err(format!("无法识别的日期格式: {}", value))
}

/// 去除首尾的非数字标记字符（如 "*2024-05-01" / "2024-05-01 ~"）
pub fn strip_date_marker(raw: &str) -> &str {
    raw.trim().trim_matches(|c: char| !c.is_ascii_digit())
}

/// 宽松解析日期: 先去标记再解析,失败返回 None
pub fn parse_marked_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(strip_date_marker(raw))
        .ok()
        .flatten()
        .map(|ts| ts.date())
}
