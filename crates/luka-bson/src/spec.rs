//! BSON 规范定义模块
//!
//! 定义 BSON 二进制格式的元素类型标记、二进制子类型和限制常量。

/// 最小合法文档大小: 4 字节长度 + 结尾零字节
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// 最大嵌套深度 (防止栈溢出)
pub const MAX_NESTING_DEPTH: usize = 100;

/// 日期时间零值哨兵: 0001-01-01T00:00:00Z 对应的毫秒数
pub const ZERO_DATETIME_MILLIS: i64 = -62_135_596_800_000;

/// 二进制子类型: 通用 (解码为裸字节序列)
pub const BINARY_GENERIC: u8 = 0x00;

/// 二进制子类型: 函数
pub const BINARY_FUNCTION: u8 = 0x01;

/// 二进制子类型: 旧式二进制 (带冗余长度前缀, 解码为裸字节序列)
pub const BINARY_OLD: u8 = 0x02;

/// 二进制子类型: 旧式 UUID
pub const BINARY_UUID_OLD: u8 = 0x03;

/// 二进制子类型: UUID
pub const BINARY_UUID: u8 = 0x04;

/// 二进制子类型: MD5
pub const BINARY_MD5: u8 = 0x05;

/// 二进制子类型: 用户自定义起始值
pub const BINARY_USER_DEFINED: u8 = 0x80;

/// BSON 元素类型标记
///
/// 每个文档元素以 1 字节类型标记开头,标记决定载荷的编码方式。
/// 0x06 (Undefined) 与 0x0C (DBPointer) 等已废弃类型在实际数据中
/// 仍然可见,解码器必须接受。
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 64 位 IEEE-754 浮点数
    Float64 = 0x01,
    /// UTF-8 字符串 (长度前缀 + NUL 结尾)
    String = 0x02,
    /// 嵌套文档
    Document = 0x03,
    /// 数组 (键为十进制下标的文档)
    Array = 0x04,
    /// 二进制数据 (长度 + 子类型 + 字节)
    Binary = 0x05,
    /// Undefined (已废弃)
    Undefined = 0x06,
    /// ObjectId (12 字节)
    ObjectId = 0x07,
    /// 布尔值 (1 字节, 必须为 0 或 1)
    Bool = 0x08,
    /// UTC 日期时间 (Unix 毫秒, i64)
    DateTime = 0x09,
    /// Null
    Null = 0x0A,
    /// 正则表达式 (两个 C 字符串)
    Regex = 0x0B,
    /// DBPointer (已废弃: 字符串 + 12 字节 id)
    DbPointer = 0x0C,
    /// JavaScript 代码 (无作用域)
    JavaScript = 0x0D,
    /// Symbol (已废弃, 编码同字符串)
    Symbol = 0x0E,
    /// JavaScript 代码 (带作用域文档)
    JavaScriptWithScope = 0x0F,
    /// 32 位有符号整数
    Int32 = 0x10,
    /// MongoDB 内部时间戳
    Timestamp = 0x11,
    /// 64 位有符号整数
    Int64 = 0x12,
    /// 128 位十进制浮点数
    Decimal128 = 0x13,
    /// 排序最小哨兵
    MinKey = 0xFF,
    /// 排序最大哨兵
    MaxKey = 0x7F,
}

impl ElementKind {
    /// # Brief
    /// 从类型标记字节转换为 ElementKind
    ///
    /// # Arguments
    /// * `byte` - 元素类型标记字节
    ///
    /// # Returns
    /// Some(ElementKind) 如果是有效标记, 否则 None
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Float64),
            0x02 => Some(Self::String),
            0x03 => Some(Self::Document),
            0x04 => Some(Self::Array),
            0x05 => Some(Self::Binary),
            0x06 => Some(Self::Undefined),
            0x07 => Some(Self::ObjectId),
            0x08 => Some(Self::Bool),
            0x09 => Some(Self::DateTime),
            0x0A => Some(Self::Null),
            0x0B => Some(Self::Regex),
            0x0C => Some(Self::DbPointer),
            0x0D => Some(Self::JavaScript),
            0x0E => Some(Self::Symbol),
            0x0F => Some(Self::JavaScriptWithScope),
            0x10 => Some(Self::Int32),
            0x11 => Some(Self::Timestamp),
            0x12 => Some(Self::Int64),
            0x13 => Some(Self::Decimal128),
            0xFF => Some(Self::MinKey),
            0x7F => Some(Self::MaxKey),
            _ => None,
        }
    }

    /// 类型标记的名称,用于错误信息
    pub fn name(&self) -> &'static str {
        match self {
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Document => "document",
            Self::Array => "array",
            Self::Binary => "binary",
            Self::Undefined => "undefined",
            Self::ObjectId => "objectId",
            Self::Bool => "bool",
            Self::DateTime => "dateTime",
            Self::Null => "null",
            Self::Regex => "regex",
            Self::DbPointer => "dbPointer",
            Self::JavaScript => "javascript",
            Self::Symbol => "symbol",
            Self::JavaScriptWithScope => "javascriptWithScope",
            Self::Int32 => "int32",
            Self::Timestamp => "timestamp",
            Self::Int64 => "int64",
            Self::Decimal128 => "decimal128",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X} ({})", *self as u8, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_roundtrip() {
        for byte in [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10, 0x11, 0x12, 0x13, 0x7F, 0xFF,
        ] {
            let kind = ElementKind::from_u8(byte).unwrap();
            assert_eq!(kind as u8, byte);
        }
    }

    #[test]
    fn test_from_u8_rejects_unknown() {
        assert_eq!(ElementKind::from_u8(0x00), None);
        assert_eq!(ElementKind::from_u8(0x14), None);
        assert_eq!(ElementKind::from_u8(0x42), None);
        assert_eq!(ElementKind::from_u8(0xFE), None);
    }

    #[test]
    fn test_display_contains_tag() {
        assert_eq!(format!("{}", ElementKind::Binary), "0x05 (binary)");
    }
}
