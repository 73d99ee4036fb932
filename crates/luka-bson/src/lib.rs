//! # LukaBSON - BSON 解码库
//!
//! LukaBSON 是面向 MongoDB 生态的 BSON (Binary JSON) 反序列化库,
//! 把一段完整的 BSON 文档字节解码为调用方指定形状的内存值:
//!
//! - **多态解码**: 解码为 [`BsonValue`],保留键序与全部元素类型
//! - **定型解码**: 解码进映射、序列、记录 (结构体)、`Option` 链等
//!   任意嵌套的目标,类型派发在编译期完成
//! - **零拷贝原始值**: [`RawBson`] 直接借用输入缓冲区,不复制载荷
//! - **自解码钩子**: 目标类型实现 [`SetBson`] 即可自行消费原始字节
//! - **严格/宽松两种模式**: 宽松模式丢弃类型不匹配的元素,严格模式
//!   立即报错;结构性损坏在两种模式下都立即终止
//!
//! ## 快速开始
//!
//! ```rust,ignore
//! use luka_bson::{decode, decode_into};
//! use indexmap::IndexMap;
//!
//! // 多态解码
//! let value = decode(&bytes)?;
//! println!("{}", value);
//!
//! // 定型解码
//! let mut doc: IndexMap<String, String> = IndexMap::new();
//! decode_into(&bytes, &mut doc)?;
//! ```
//!
//! 编码方向、ObjectId 生成与传输层不在本库范围内。

pub mod de;
pub mod decode;
pub mod raw;
pub mod record;
pub mod slot;
pub mod spec;
pub mod value;

pub use decode::{
    decode, decode_into, decode_into_strict, decode_into_with, decode_strict, DecodeOptions,
};
pub use raw::{element_size, RawBson, RawDocEntry, RawOrderedDocument};
pub use record::{field_index, FieldIndex, FieldSpec, RecordSlot};
pub use slot::{
    FixedSeqSlot, FromBson, MapKey, MapSlot, NullableSlot, SeqSlot, SetAction, SetBson, Slot,
};
pub use spec::ElementKind;
pub use value::{
    zero_datetime, Binary, BsonValue, DbPointerValue, Decimal128, DocEntry, JavaScriptValue,
    OrderedDocument, RegexValue,
};

use thiserror::Error;

/// BSON 解码的错误类型
///
/// 错误分两类:结构性错误(文档本身损坏)在任何模式下都终止整个
/// 解码;语义性错误(元素与目标形状不匹配,即 [`BsonError::TypeMismatch`])
/// 在宽松模式下被文档解码器吞掉并丢弃该元素,在严格模式下终止文档。
#[derive(Error, Debug)]
pub enum BsonError {
    /// 文档结构损坏
    #[error("Document is corrupted: {0}")]
    Corrupted(String),

    /// 读取越过缓冲区末尾
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// 字符串不是有效的 UTF-8 编码
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// 未知的元素类型标记
    #[error("Unknown element kind: 0x{0:02X}")]
    UnknownElementKind(u8),

    /// 元素类型与目标形状不匹配 (唯一可被宽松模式恢复的错误)
    #[error("BSON kind {kind} is not compatible with target type {target}")]
    TypeMismatch {
        /// 线上元素类型
        kind: spec::ElementKind,
        /// 目标形状名称
        target: &'static str,
    },

    /// 顶层目标无法承载文档
    #[error("Unsupported document target: {0}")]
    UnsupportedTarget(&'static str),

    /// 定长数组与线上数组长度不一致
    #[error("Array length mismatch: document has {actual}, target holds {expected}")]
    LengthMismatch {
        /// 目标长度
        expected: usize,
        /// 线上元素个数
        actual: usize,
    },

    /// 嵌套层级过深
    #[error("Nesting too deep: max {0}")]
    NestingTooDeep(usize),

    /// 映射键无法从元素名解析
    #[error("Invalid map key: {0}")]
    InvalidMapKey(String),

    /// URL 目标解析失败
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 文档之后存在多余字节
    #[error("Trailing bytes after document")]
    TrailingBytes,

    /// 钩子返回的错误
    #[error("Setter failed: {0}")]
    Setter(String),

    /// Serde 反序列化过程错误
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl BsonError {
    /// 是否为语义性错误 (宽松模式下可恢复)
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, BsonError::TypeMismatch { .. })
    }
}

/// BSON 解码的 Result 类型别名
pub type BsonResult<T> = Result<T, BsonError>;
