//! 原始元素模块
//!
//! 提供零拷贝的原始元素表示 `RawBson` 以及纯函数的元素测长器
//! `element_size`。测长器同时服务于解析(前进多少字节)和跳过
//! (丢弃不需要的元素)两条路径。

use compact_str::CompactString;

use crate::spec::ElementKind;
use crate::{BsonError, BsonResult};

/// 原始元素: (类型标记, 未解析的载荷字节)
///
/// `data` 借用输入缓冲区,生命周期不超过缓冲区本身。对文档/数组
/// 元素,载荷包含完整的长度前缀与结尾零字节;对字符串类元素,载荷
/// 包含长度前缀。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBson<'b> {
    /// 元素类型标记
    pub kind: ElementKind,
    /// 未解析的载荷字节 (零拷贝)
    pub data: &'b [u8],
}

impl Default for RawBson<'_> {
    fn default() -> Self {
        RawBson {
            kind: ElementKind::Null,
            data: &[],
        }
    }
}

/// 原始有序文档中的一个元素: (键名, 原始值)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocEntry<'b> {
    /// 元素键名
    pub name: CompactString,
    /// 未解析的元素值
    pub value: RawBson<'b>,
}

/// 原始有序文档: 按线上顺序保存 (键名, 原始值) 对的序列
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawOrderedDocument<'b>(pub Vec<RawDocEntry<'b>>);

/// 读取 offset 处的 4 字节小端长度字段
fn read_len_at(offset: usize, buf: &[u8]) -> BsonResult<i64> {
    if offset + 4 > buf.len() {
        return Err(BsonError::UnexpectedEof);
    }
    let bytes = [buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]];
    Ok(i32::from_le_bytes(bytes) as i64)
}

/// 计算元素载荷的字节长度
///
/// # Brief
/// 纯函数: 不移动任何游标,返回类型标记为 `kind`、载荷起始于
/// `buf[offset]` 的元素占用的字节数
///
/// # Arguments
/// * `kind` - 元素类型标记字节
/// * `offset` - 载荷在缓冲区中的起始偏移
/// * `buf` - 输入缓冲区
///
/// # Returns
/// 成功返回载荷长度;未知标记、声明长度过小、缺失 NUL 结尾或越界
/// 时返回错误
pub fn element_size(kind: u8, offset: usize, buf: &[u8]) -> BsonResult<usize> {
    match ElementKind::from_u8(kind) {
        Some(ElementKind::Float64) => Ok(8),
        Some(ElementKind::String)
        | Some(ElementKind::JavaScript)
        | Some(ElementKind::Symbol) => {
            let size = read_len_at(offset, buf)?;
            if size < 1 {
                return Err(BsonError::Corrupted(
                    "string size can't be less than one byte".to_string(),
                ));
            }
            let total = size as usize + 4;
            if offset + total > buf.len() {
                return Err(BsonError::UnexpectedEof);
            }
            if buf[offset + total - 1] != 0 {
                return Err(BsonError::Corrupted(
                    "invalid string: not zero-terminated".to_string(),
                ));
            }
            Ok(total)
        }
        Some(ElementKind::Document) | Some(ElementKind::Array) => {
            let size = read_len_at(offset, buf)?;
            if size < 5 {
                return Err(BsonError::Corrupted(
                    "declared document size is too small".to_string(),
                ));
            }
            Ok(size as usize)
        }
        Some(ElementKind::Binary) => {
            let size = read_len_at(offset, buf)?;
            if size < 0 {
                return Err(BsonError::Corrupted(
                    "binary data size can't be negative".to_string(),
                ));
            }
            Ok(size as usize + 5)
        }
        Some(ElementKind::Undefined) => Ok(0),
        Some(ElementKind::ObjectId) => Ok(12),
        Some(ElementKind::Bool) => Ok(1),
        Some(ElementKind::DateTime) => Ok(8),
        Some(ElementKind::Null) => Ok(0),
        Some(ElementKind::Regex) => {
            // 两个连续的 C 字符串
            let mut end = offset;
            for _ in 0..2 {
                while end < buf.len() && buf[end] != 0 {
                    end += 1;
                }
                end += 1;
            }
            if end > buf.len() {
                return Err(BsonError::UnexpectedEof);
            }
            Ok(end - offset)
        }
        Some(ElementKind::DbPointer) => {
            let size = read_len_at(offset, buf)?;
            if size < 1 {
                return Err(BsonError::Corrupted(
                    "string size can't be less than one byte".to_string(),
                ));
            }
            Ok(size as usize + 4 + 12)
        }
        Some(ElementKind::JavaScriptWithScope) => {
            // 最小: 4 字节总长 + 最小字符串 (4+1) + 最小文档 (5)
            let size = read_len_at(offset, buf)?;
            if size < 14 {
                return Err(BsonError::Corrupted(
                    "declared element size is too small".to_string(),
                ));
            }
            Ok(size as usize)
        }
        Some(ElementKind::Int32) => Ok(4),
        Some(ElementKind::Timestamp) => Ok(8),
        Some(ElementKind::Int64) => Ok(8),
        Some(ElementKind::Decimal128) => Ok(16),
        Some(ElementKind::MinKey) | Some(ElementKind::MaxKey) => Ok(0),
        None => Err(BsonError::UnknownElementKind(kind)),
    }
}
