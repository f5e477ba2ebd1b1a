//! 通用工具函数

use crate::{HospitalError, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// 预约时间格式
pub const APPOINTMENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 生成顺序ID，如 P1, P2, D1
///
/// 只统计以 `prefix` 开头且后缀为数字的ID，其余ID被忽略。
/// 最大后缀无法再加一或加一后已被占用时，退回到最小的未占用编号。
pub fn next_id<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: BTreeSet<u64> = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .collect();

    let after_max = match taken.last() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    };
    let index = after_max
        .filter(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| (1..).find(|n| !taken.contains(n)).unwrap_or(0));

    format!("{}{}", prefix, index)
}

/// 解析并规范化预约时间
pub fn parse_appointment_time(input: &str) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(input.trim(), APPOINTMENT_TIME_FORMAT)
        .map_err(|_| {
            HospitalError::Validation("date/time format should be YYYY-MM-DD HH:MM".to_string())
        })?;

    Ok(parsed.format(APPOINTMENT_TIME_FORMAT).to_string())
}
