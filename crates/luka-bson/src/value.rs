//! BSON 值类型定义模块
//!
//! 定义 BSON 格式全部元素类型对应的内存值,包括基础类型和复合类型。
//! 使用 `CompactString` 优化短字符串与键名的内存占用。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use compact_str::CompactString;
use indexmap::IndexMap;
use luka_common::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::spec::ZERO_DATETIME_MILLIS;

/// BSON 值的枚举类型
///
/// 每个 BSON 元素类型都有一个对应变体,解码到多态目标时产生该类型。
///
/// # 支持的类型
///
/// - **基础类型**: Null, Boolean, Int32/64, Float64, String, Binary
/// - **标识类型**: ObjectId
/// - **时间类型**: DateTime, Timestamp
/// - **复合类型**: Array, Document (保持键序)
/// - **特殊类型**: Regex, JavaScript, Symbol, DbPointer, Decimal128,
///   MinKey/MaxKey/Undefined 哨兵
///
/// # 示例
///
/// ```rust,ignore
/// use luka_bson::BsonValue;
///
/// let value = BsonValue::String("hello".into());
/// assert_eq!(value.type_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BsonValue {
    /// 空值
    Null,
    /// 布尔值
    Boolean(bool),
    /// 32位有符号整数
    Int32(i32),
    /// 64位有符号整数
    Int64(i64),
    /// 64位浮点数
    Float64(f64),
    /// UTF-8 字符串
    String(CompactString),
    /// 二进制数据 (带子类型)
    Binary(Binary),
    /// 12字节的唯一对象标识符
    ObjectId(ObjectId),
    /// UTC 日期时间
    DateTime(DateTime<Utc>),
    /// MongoDB 内部时间戳 (原始 i64)
    Timestamp(i64),
    /// 正则表达式
    Regex(RegexValue),
    /// JavaScript 代码 (可带作用域)
    JavaScript(JavaScriptValue),
    /// Symbol (已废弃的字符串别名类型)
    Symbol(CompactString),
    /// DBPointer (已废弃)
    DbPointer(DbPointerValue),
    /// 128 位十进制浮点数 (原始低/高 64 位)
    Decimal128(Decimal128),
    /// 值数组
    Array(Vec<BsonValue>),
    /// 文档 (有序键值对)
    Document(IndexMap<CompactString, BsonValue>),
    /// 排序最小哨兵
    MinKey,
    /// 排序最大哨兵
    MaxKey,
    /// Undefined 哨兵 (已废弃)
    Undefined,
}

/// 二进制值
///
/// 保留线上子类型字节;子类型 0x00/0x02 在基础转换中按裸字节处理。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Binary {
    /// 二进制子类型字节
    pub subtype: u8,
    /// 数据载荷
    pub data: Vec<u8>,
}

/// 正则表达式值
///
/// 包含正则表达式的模式和选项(如 i, m, s 等)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegexValue {
    /// 正则表达式模式
    pub pattern: CompactString,
    /// 正则表达式选项
    pub options: CompactString,
}

/// JavaScript 代码值
///
/// 包含 JavaScript 代码字符串和可选的作用域(变量绑定)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JavaScriptValue {
    /// JavaScript 代码
    pub code: CompactString,
    /// 作用域(可选的变量绑定)
    pub scope: Option<IndexMap<CompactString, BsonValue>>,
}

/// DBPointer 值 (已废弃的引用类型)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DbPointerValue {
    /// 目标命名空间
    pub namespace: CompactString,
    /// 目标文档 id
    pub id: ObjectId,
}

/// 128 位十进制浮点数的原始表示
///
/// 按线上布局保存低/高 64 位,不做十进制运算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decimal128 {
    /// 低 64 位
    pub low: u64,
    /// 高 64 位
    pub high: u64,
}

/// 有序文档中的一个元素: (键名, 值)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocEntry {
    /// 元素键名
    pub name: CompactString,
    /// 元素值
    pub value: BsonValue,
}

/// 有序文档: 按线上顺序保存 (键名, 值) 对的序列
///
/// 与 `Document` 变体不同,重复键在此处不会互相覆盖。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderedDocument(pub Vec<DocEntry>);

/// 日期时间零值
///
/// # Brief
/// 返回 0001-01-01T00:00:00Z,对应线上编码 -62135596800000 毫秒
///
/// # Returns
/// 零值时间点
pub fn zero_datetime() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ZERO_DATETIME_MILLIS).single().unwrap()
}

impl BsonValue {
    /// 获取值的类型名称
    ///
    /// # Brief
    /// 返回 BSON 值的类型名称字符串
    ///
    /// # Returns
    /// 类型名称的静态字符串引用
    pub fn type_name(&self) -> &'static str {
        match self {
            BsonValue::Null => "null",
            BsonValue::Boolean(_) => "boolean",
            BsonValue::Int32(_) => "int32",
            BsonValue::Int64(_) => "int64",
            BsonValue::Float64(_) => "float64",
            BsonValue::String(_) => "string",
            BsonValue::Binary(_) => "binary",
            BsonValue::ObjectId(_) => "objectId",
            BsonValue::DateTime(_) => "dateTime",
            BsonValue::Timestamp(_) => "timestamp",
            BsonValue::Regex(_) => "regex",
            BsonValue::JavaScript(_) => "javascript",
            BsonValue::Symbol(_) => "symbol",
            BsonValue::DbPointer(_) => "dbPointer",
            BsonValue::Decimal128(_) => "decimal128",
            BsonValue::Array(_) => "array",
            BsonValue::Document(_) => "document",
            BsonValue::MinKey => "minKey",
            BsonValue::MaxKey => "maxKey",
            BsonValue::Undefined => "undefined",
        }
    }

    /// 检查值是否为 Null
    pub fn is_null(&self) -> bool {
        matches!(self, BsonValue::Null)
    }

    /// 尝试获取布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// 尝试获取 i32 值
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            BsonValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// 尝试获取 i64 值
    ///
    /// # Brief
    /// 如果值是整数类型(Int32 或 Int64),返回 i64 值
    ///
    /// # Returns
    /// `Some(i64)` 如果是整数类型,否则 `None`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BsonValue::Int32(n) => Some(*n as i64),
            BsonValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// 尝试获取 f64 值
    ///
    /// # Brief
    /// 如果值是数值类型,返回 f64 值(支持自动类型转换)
    ///
    /// # Returns
    /// `Some(f64)` 如果是数值类型,否则 `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BsonValue::Float64(n) => Some(*n),
            BsonValue::Int32(n) => Some(*n as f64),
            BsonValue::Int64(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// 尝试获取字符串引用
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BsonValue::String(s) | BsonValue::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 尝试获取二进制数据引用
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            BsonValue::Binary(b) => Some(&b.data),
            _ => None,
        }
    }

    /// 尝试获取数组引用
    pub fn as_array(&self) -> Option<&Vec<BsonValue>> {
        match self {
            BsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// 尝试获取文档引用
    pub fn as_document(&self) -> Option<&IndexMap<CompactString, BsonValue>> {
        match self {
            BsonValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// 获取指定键的值
    ///
    /// # Brief
    /// 从文档中获取指定键的值,或从数组中获取指定索引的值
    ///
    /// # Arguments
    /// * `key` - 键名(文档)或索引字符串(数组)
    ///
    /// # Returns
    /// `Some(&BsonValue)` 如果找到,否则 `None`
    pub fn get(&self, key: &str) -> Option<&BsonValue> {
        match self {
            BsonValue::Document(doc) => doc.get(key),
            BsonValue::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        }
    }

    /// 按路径获取嵌套值
    ///
    /// # Brief
    /// 使用点分隔的路径访问嵌套文档中的值
    ///
    /// # Arguments
    /// * `path` - 点分隔的路径,如 "user.address.city"
    ///
    /// # Returns
    /// `Some(&BsonValue)` 如果路径存在,否则 `None`
    pub fn get_path(&self, path: &str) -> Option<&BsonValue> {
        let mut current = self;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }
}

impl Default for BsonValue {
    fn default() -> Self {
        BsonValue::Null
    }
}

impl fmt::Display for BsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BsonValue::Null => write!(f, "null"),
            BsonValue::Boolean(b) => write!(f, "{}", b),
            BsonValue::Int32(n) => write!(f, "{}", n),
            BsonValue::Int64(n) => write!(f, "{}", n),
            BsonValue::Float64(n) => write!(f, "{}", n),
            BsonValue::String(s) => write!(f, "\"{}\"", s),
            BsonValue::Binary(b) => write!(f, "<binary:{:#04x}:{} bytes>", b.subtype, b.data.len()),
            BsonValue::ObjectId(id) => write!(f, "ObjectId(\"{}\")", id),
            BsonValue::DateTime(dt) => write!(f, "DateTime(\"{}\")", dt),
            BsonValue::Timestamp(ts) => write!(f, "Timestamp({})", ts),
            BsonValue::Regex(r) => write!(f, "/{}/{}", r.pattern, r.options),
            BsonValue::JavaScript(js) => {
                if let Some(scope) = &js.scope {
                    write!(f, "JavaScript({}, scope: {} vars)", js.code, scope.len())
                } else {
                    write!(f, "JavaScript({})", js.code)
                }
            }
            BsonValue::Symbol(s) => write!(f, "Symbol(\"{}\")", s),
            BsonValue::DbPointer(p) => write!(f, "DBPointer(\"{}\", \"{}\")", p.namespace, p.id),
            BsonValue::Decimal128(d) => write!(f, "Decimal128({:#018x}, {:#018x})", d.high, d.low),
            BsonValue::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            BsonValue::Document(doc) => {
                write!(f, "{{")?;
                for (i, (k, v)) in doc.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", k, v)?;
                }
                write!(f, "}}")
            }
            BsonValue::MinKey => write!(f, "MinKey"),
            BsonValue::MaxKey => write!(f, "MaxKey"),
            BsonValue::Undefined => write!(f, "undefined"),
        }
    }
}

// ============================================================================
// From 特征实现 - 支持从各种 Rust 类型转换为 BsonValue
// ============================================================================

impl From<bool> for BsonValue {
    fn from(v: bool) -> Self {
        BsonValue::Boolean(v)
    }
}

impl From<i32> for BsonValue {
    fn from(v: i32) -> Self {
        BsonValue::Int32(v)
    }
}

impl From<i64> for BsonValue {
    fn from(v: i64) -> Self {
        BsonValue::Int64(v)
    }
}

impl From<f64> for BsonValue {
    fn from(v: f64) -> Self {
        BsonValue::Float64(v)
    }
}

impl From<&str> for BsonValue {
    fn from(v: &str) -> Self {
        BsonValue::String(CompactString::from(v))
    }
}

impl From<String> for BsonValue {
    fn from(v: String) -> Self {
        BsonValue::String(CompactString::from(v))
    }
}

impl From<Vec<u8>> for BsonValue {
    fn from(v: Vec<u8>) -> Self {
        BsonValue::Binary(Binary {
            subtype: crate::spec::BINARY_GENERIC,
            data: v,
        })
    }
}

impl From<ObjectId> for BsonValue {
    fn from(v: ObjectId) -> Self {
        BsonValue::ObjectId(v)
    }
}

impl From<DateTime<Utc>> for BsonValue {
    fn from(v: DateTime<Utc>) -> Self {
        BsonValue::DateTime(v)
    }
}

impl From<Vec<BsonValue>> for BsonValue {
    fn from(v: Vec<BsonValue>) -> Self {
        BsonValue::Array(v)
    }
}

impl From<IndexMap<CompactString, BsonValue>> for BsonValue {
    fn from(v: IndexMap<CompactString, BsonValue>) -> Self {
        BsonValue::Document(v)
    }
}

// ============================================================================
// JSON 互转支持 (扩展 JSON 表示)
// ============================================================================

impl From<serde_json::Value> for BsonValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => BsonValue::Null,
            serde_json::Value::Bool(b) => BsonValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        BsonValue::Int32(i as i32)
                    } else {
                        BsonValue::Int64(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    BsonValue::Float64(f)
                } else {
                    BsonValue::Null
                }
            }
            serde_json::Value::String(s) => BsonValue::String(CompactString::from(s)),
            serde_json::Value::Array(arr) => {
                BsonValue::Array(arr.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut doc = IndexMap::new();
                for (k, v) in obj {
                    doc.insert(CompactString::from(k), v.into());
                }
                BsonValue::Document(doc)
            }
        }
    }
}

impl From<BsonValue> for serde_json::Value {
    fn from(v: BsonValue) -> Self {
        use serde_json::{json, Map, Value as JsonValue};
        match v {
            BsonValue::Null => JsonValue::Null,
            BsonValue::Boolean(b) => JsonValue::Bool(b),
            BsonValue::Int32(n) => JsonValue::Number(n.into()),
            BsonValue::Int64(n) => JsonValue::Number(n.into()),
            BsonValue::Float64(n) => serde_json::Number::from_f64(n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            BsonValue::String(s) => JsonValue::String(s.to_string()),
            BsonValue::Binary(b) => json!({
                "$binary": STANDARD.encode(&b.data),
                "$type": format!("{:02x}", b.subtype),
            }),
            BsonValue::ObjectId(id) => json!({ "$oid": id.to_hex() }),
            BsonValue::DateTime(dt) => json!({ "$date": dt.to_rfc3339() }),
            BsonValue::Timestamp(ts) => json!({ "$timestamp": ts }),
            BsonValue::Regex(r) => json!({
                "$regex": r.pattern.to_string(),
                "$options": r.options.to_string(),
            }),
            BsonValue::JavaScript(js) => {
                let mut map = Map::new();
                map.insert("$code".to_string(), JsonValue::String(js.code.to_string()));
                if let Some(scope) = js.scope {
                    map.insert(
                        "$scope".to_string(),
                        BsonValue::Document(scope).into(),
                    );
                }
                JsonValue::Object(map)
            }
            BsonValue::Symbol(s) => json!({ "$symbol": s.to_string() }),
            BsonValue::DbPointer(p) => json!({
                "$dbPointer": { "$ref": p.namespace.to_string(), "$id": p.id.to_hex() },
            }),
            BsonValue::Decimal128(d) => json!({
                "$numberDecimal128": { "low": d.low, "high": d.high },
            }),
            BsonValue::Array(arr) => {
                JsonValue::Array(arr.into_iter().map(Into::into).collect())
            }
            BsonValue::Document(doc) => {
                let mut map = Map::new();
                for (k, v) in doc {
                    map.insert(k.to_string(), v.into());
                }
                JsonValue::Object(map)
            }
            BsonValue::MinKey => json!({ "$minKey": 1 }),
            BsonValue::MaxKey => json!({ "$maxKey": 1 }),
            BsonValue::Undefined => json!({ "$undefined": true }),
        }
    }
}

/// 构造 BsonValue 的便捷宏
///
/// # 示例
///
/// ```rust,ignore
/// use luka_bson::bson;
///
/// let null = bson!(null);
/// let boolean = bson!(true);
/// let number = bson!(42);
/// let string = bson!("hello");
/// let array = bson!([1, 2, 3]);
/// let doc = bson!({ "name": "test", "value": 123 });
/// ```
#[macro_export]
macro_rules! bson {
    (null) => {
        $crate::BsonValue::Null
    };
    (true) => {
        $crate::BsonValue::Boolean(true)
    };
    (false) => {
        $crate::BsonValue::Boolean(false)
    };
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::BsonValue::Array(vec![ $($crate::bson!($elem)),* ])
    };
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            let mut doc = indexmap::IndexMap::new();
            $(
                doc.insert(compact_str::CompactString::from($key), $crate::bson!($value));
            )*
            $crate::BsonValue::Document(doc)
        }
    };
    ($e:expr) => {
        $crate::BsonValue::from($e)
    };
}
