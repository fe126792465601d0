// ==========================================
// 工程采购管理系统 - 列编解码工具
// ==========================================
// 职责: JSON 列 / 枚举列的统一编解码
// 时间列直接使用 rusqlite 的 chrono 支持
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::{de::DeserializeOwned, Serialize};

/// 序列化为 JSON 列
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> RepositoryResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// 从 JSON 列反序列化
///
/// 解析失败视为数据错误（不静默置空, 明细列表丢失会破坏金额不变量）
pub(crate) fn from_json<T: DeserializeOwned>(field: &str, raw: &str) -> RepositoryResult<T> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// 解析枚举列
pub(crate) fn parse_code<T>(
    field: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> RepositoryResult<T> {
    parse(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("未知取值: {}", raw),
    })
}
