//! 目标槽位模块
//!
//! 解码目标的运行时描述。每个可解码类型通过 `FromBson` 把自身的可写
//! 位置暴露为一个 `Slot` 变体,解码器对槽位做穷举分派,不依赖任何
//! 运行时反射。容器与记录类型通过对象安全的特征接入,使同一套遍历
//! 代码覆盖任意嵌套的目标形状。

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use compact_str::CompactString;
use indexmap::IndexMap;
use luka_common::ObjectId;
use url::Url;

use crate::raw::{RawBson, RawOrderedDocument};
use crate::record::RecordSlot;
use crate::spec::ElementKind;
use crate::value::{
    Binary, BsonValue, Decimal128, JavaScriptValue, OrderedDocument, RegexValue,
};
use crate::{BsonError, BsonResult};

/// 可写目标槽位
///
/// 借用调用方存储的一个可写位置,并携带其声明形状。`'t` 是目标借用
/// 的生命周期,`'b` 是输入缓冲区的生命周期(只有原始槽位会保留它)。
pub enum Slot<'t, 'b> {
    /// 布尔槽位
    Bool(&'t mut bool),
    /// 有符号整数槽位
    I8(&'t mut i8),
    I16(&'t mut i16),
    I32(&'t mut i32),
    I64(&'t mut i64),
    /// 无符号整数槽位
    U8(&'t mut u8),
    U16(&'t mut u16),
    U32(&'t mut u32),
    U64(&'t mut u64),
    /// 浮点槽位
    F32(&'t mut f32),
    F64(&'t mut f64),
    /// 字符串槽位
    Str(&'t mut String),
    /// JSON 数值槽位 (整数与浮点按十进制格式化)
    JsonNumber(&'t mut serde_json::Number),
    /// ObjectId 槽位
    ObjectId(&'t mut ObjectId),
    /// UTC 日期时间槽位
    DateTime(&'t mut DateTime<Utc>),
    /// 时长槽位 (Int64 元素按毫秒解释)
    Duration(&'t mut Duration),
    /// 128 位十进制槽位
    Decimal(&'t mut Decimal128),
    /// 正则表达式槽位
    Regex(&'t mut RegexValue),
    /// JavaScript 槽位
    JavaScript(&'t mut JavaScriptValue),
    /// 二进制槽位 (字节切片以默认子类型包装)
    Binary(&'t mut Binary),
    /// URL 槽位 (字符串解析,解析失败为致命错误)
    Url(&'t mut Url),
    /// 多态槽位: 任意元素以自然类型存入
    Any(&'t mut BsonValue),
    /// 原始槽位: 零拷贝保留 (类型标记, 载荷字节)
    Raw(&'t mut RawBson<'b>),
    /// 有序文档槽位
    OrderedDoc(&'t mut OrderedDocument),
    /// 原始有序文档槽位
    RawOrderedDoc(&'t mut RawOrderedDocument<'b>),
    /// 变长序列槽位
    Seq(&'t mut dyn SeqSlot<'b>),
    /// 定长序列槽位 (长度必须与线上数组一致)
    FixedSeq(&'t mut dyn FixedSeqSlot<'b>),
    /// 映射槽位 (键从元素名强转)
    Map(&'t mut dyn MapSlot<'b>),
    /// 记录槽位 (命名字段 + 字段索引)
    Record(&'t mut dyn RecordSlot<'b>),
    /// 可空槽位 (Option 链,成功才提交)
    Nullable(&'t mut dyn NullableSlot<'b>),
    /// 钩子槽位 (目标自行消费原始元素)
    Hook(&'t mut dyn SetBson),
}

impl<'t, 'b> Slot<'t, 'b> {
    /// 槽位形状名称,用于类型不匹配的错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            Slot::Bool(_) => "bool",
            Slot::I8(_) => "i8",
            Slot::I16(_) => "i16",
            Slot::I32(_) => "i32",
            Slot::I64(_) => "i64",
            Slot::U8(_) => "u8",
            Slot::U16(_) => "u16",
            Slot::U32(_) => "u32",
            Slot::U64(_) => "u64",
            Slot::F32(_) => "f32",
            Slot::F64(_) => "f64",
            Slot::Str(_) => "string",
            Slot::JsonNumber(_) => "json number",
            Slot::ObjectId(_) => "objectId",
            Slot::DateTime(_) => "dateTime",
            Slot::Duration(_) => "duration",
            Slot::Decimal(_) => "decimal128",
            Slot::Regex(_) => "regex",
            Slot::JavaScript(_) => "javascript",
            Slot::Binary(_) => "binary",
            Slot::Url(_) => "url",
            Slot::Any(_) => "any",
            Slot::Raw(_) => "raw",
            Slot::OrderedDoc(_) => "ordered document",
            Slot::RawOrderedDoc(_) => "raw ordered document",
            Slot::Seq(_) => "sequence",
            Slot::FixedSeq(_) => "fixed-length array",
            Slot::Map(_) => "map",
            Slot::Record(_) => "record",
            Slot::Nullable(_) => "option",
            Slot::Hook(_) => "setter",
        }
    }

    /// 将槽位重置为零值
    ///
    /// Null 元素解码到任何目标都会调用此方法。URL 槽位没有零值,
    /// 报类型不匹配。
    pub fn assign_zero(self) -> BsonResult<()> {
        match self {
            Slot::Bool(v) => *v = false,
            Slot::I8(v) => *v = 0,
            Slot::I16(v) => *v = 0,
            Slot::I32(v) => *v = 0,
            Slot::I64(v) => *v = 0,
            Slot::U8(v) => *v = 0,
            Slot::U16(v) => *v = 0,
            Slot::U32(v) => *v = 0,
            Slot::U64(v) => *v = 0,
            Slot::F32(v) => *v = 0.0,
            Slot::F64(v) => *v = 0.0,
            Slot::Str(v) => v.clear(),
            Slot::JsonNumber(v) => *v = serde_json::Number::from(0),
            Slot::ObjectId(v) => *v = ObjectId::default(),
            Slot::DateTime(v) => *v = DateTime::<Utc>::default(),
            Slot::Duration(v) => *v = Duration::zero(),
            Slot::Decimal(v) => *v = Decimal128::default(),
            Slot::Regex(v) => *v = RegexValue::default(),
            Slot::JavaScript(v) => *v = JavaScriptValue::default(),
            Slot::Binary(v) => *v = Binary::default(),
            Slot::Url(_) => {
                return Err(BsonError::TypeMismatch {
                    kind: ElementKind::Null,
                    target: "url",
                })
            }
            Slot::Any(v) => *v = BsonValue::Null,
            Slot::Raw(v) => *v = RawBson::default(),
            Slot::OrderedDoc(v) => v.0.clear(),
            Slot::RawOrderedDoc(v) => v.0.clear(),
            Slot::Seq(s) => s.begin(),
            Slot::FixedSeq(f) => {
                for i in 0..f.len() {
                    f.slot_at(i).assign_zero()?;
                }
            }
            Slot::Map(m) => m.begin(),
            Slot::Record(r) => r.reset(),
            Slot::Nullable(n) => n.set_none(),
            Slot::Hook(h) => h.set_zero(),
        }
        Ok(())
    }
}

/// 可解码目标类型
///
/// 实现者把自身的可写位置暴露为一个槽位。标准库容器、`BsonValue`
/// 与全部原语类型都已内置实现;记录类型通过 `RecordSlot` 接入。
pub trait FromBson<'b> {
    /// 暴露目标槽位
    fn slot(&mut self) -> Slot<'_, 'b>;
}

/// 变长序列目标
pub trait SeqSlot<'b> {
    /// 清空既有内容 (解码前调用)
    fn begin(&mut self);
    /// 追加一个零值元素并返回其槽位
    fn push_slot(&mut self) -> Slot<'_, 'b>;
    /// 丢弃最近追加的元素 (宽松模式回收失败元素)
    fn abort_last(&mut self);
}

/// 定长序列目标
pub trait FixedSeqSlot<'b> {
    /// 目标长度
    fn len(&self) -> usize;
    /// 第 index 个位置的槽位
    fn slot_at(&mut self, index: usize) -> Slot<'_, 'b>;
}

/// 映射目标
///
/// 键类型不是字符串时,`insert_slot` 负责把元素名强转为键;不可
/// 解析的键名是致命错误。
pub trait MapSlot<'b> {
    /// 清空既有条目 (解码前调用)
    fn begin(&mut self);
    /// 以零值插入 `name` 对应的条目并返回值槽位;重复键覆盖旧值
    fn insert_slot(&mut self, name: &str) -> BsonResult<Slot<'_, 'b>>;
    /// 移除 `name` 对应的条目 (宽松模式回收失败元素)
    fn abort(&mut self, name: &str);
}

/// 可空目标 (Option 链)
pub trait NullableSlot<'b> {
    /// 当前是否为 None
    fn is_none(&self) -> bool;
    /// 置为 None
    fn set_none(&mut self);
    /// 为 None 时填入零值,返回内层槽位
    fn get_or_insert_slot(&mut self) -> Slot<'_, 'b>;
}

/// 钩子响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetAction {
    /// 钩子已写入目标
    Set,
    /// 要求解码器将目标重置为零值
    Zero,
}

/// 自解码钩子
///
/// 实现此特征的目标类型自行消费原始元素字节。返回
/// `BsonError::TypeMismatch` 的失败遵循严格/宽松策略,其余错误
/// 一律终止整个解码。原始字节只在调用期间有效,不可保留。
pub trait SetBson {
    /// 消费一个原始元素
    fn set_bson(&mut self, raw: &RawBson<'_>) -> BsonResult<SetAction>;
    /// 重置为零值 (响应 [`SetAction::Zero`])
    fn set_zero(&mut self);
}

/// 映射键类型: 从元素名构造键
///
/// 数值键按十进制浮点数解析后截断转换;字符串键原样使用。其余键
/// 类型不实现此特征,在编译期即被排除。
pub trait MapKey: Sized {
    /// 从元素名解析键
    fn from_name(name: &str) -> BsonResult<Self>;
}

impl MapKey for String {
    fn from_name(name: &str) -> BsonResult<Self> {
        Ok(name.to_string())
    }
}

impl MapKey for CompactString {
    fn from_name(name: &str) -> BsonResult<Self> {
        Ok(CompactString::from(name))
    }
}

macro_rules! numeric_map_key {
    ($($t:ty),*) => {
        $(
            impl MapKey for $t {
                fn from_name(name: &str) -> BsonResult<Self> {
                    let parsed: f64 = name.parse().map_err(|e| {
                        BsonError::InvalidMapKey(format!("`{}`: {}", name, e))
                    })?;
                    Ok(parsed as $t)
                }
            }
        )*
    };
}

numeric_map_key!(i8, i16, i32, i64, u8, u16, u32, u64);

// ============================================================================
// FromBson 实现 - 原语与 BSON 结构类型
// ============================================================================

macro_rules! primitive_from_bson {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl<'b> FromBson<'b> for $t {
                fn slot(&mut self) -> Slot<'_, 'b> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

primitive_from_bson!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
    serde_json::Number => JsonNumber,
    ObjectId => ObjectId,
    Duration => Duration,
    Decimal128 => Decimal,
    RegexValue => Regex,
    JavaScriptValue => JavaScript,
    Binary => Binary,
    Url => Url,
    BsonValue => Any,
    OrderedDocument => OrderedDoc
);

impl<'b> FromBson<'b> for DateTime<Utc> {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::DateTime(self)
    }
}

impl<'b> FromBson<'b> for RawBson<'b> {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::Raw(self)
    }
}

impl<'b> FromBson<'b> for RawOrderedDocument<'b> {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::RawOrderedDoc(self)
    }
}

// ============================================================================
// FromBson 实现 - 容器
// ============================================================================

impl<'b, T: FromBson<'b> + Default> FromBson<'b> for Vec<T> {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::Seq(self)
    }
}

impl<'b, T: FromBson<'b> + Default> SeqSlot<'b> for Vec<T> {
    fn begin(&mut self) {
        self.clear();
    }

    fn push_slot(&mut self) -> Slot<'_, 'b> {
        let index = self.len();
        self.push(T::default());
        self[index].slot()
    }

    fn abort_last(&mut self) {
        self.pop();
    }
}

impl<'b, T: FromBson<'b>, const N: usize> FromBson<'b> for [T; N] {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::FixedSeq(self)
    }
}

impl<'b, T: FromBson<'b>, const N: usize> FixedSeqSlot<'b> for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn slot_at(&mut self, index: usize) -> Slot<'_, 'b> {
        self[index].slot()
    }
}

impl<'b, K, V> FromBson<'b> for IndexMap<K, V>
where
    K: MapKey + Hash + Eq,
    V: FromBson<'b> + Default,
{
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::Map(self)
    }
}

impl<'b, K, V> MapSlot<'b> for IndexMap<K, V>
where
    K: MapKey + Hash + Eq,
    V: FromBson<'b> + Default,
{
    fn begin(&mut self) {
        self.clear();
    }

    fn insert_slot(&mut self, name: &str) -> BsonResult<Slot<'_, 'b>> {
        let key = K::from_name(name)?;
        let (index, _) = self.insert_full(key, V::default());
        Ok(self
            .get_index_mut(index)
            .expect("entry was just inserted")
            .1
            .slot())
    }

    fn abort(&mut self, name: &str) {
        if let Ok(key) = K::from_name(name) {
            self.shift_remove(&key);
        }
    }
}

impl<'b, K, V> FromBson<'b> for HashMap<K, V>
where
    K: MapKey + Hash + Eq,
    V: FromBson<'b> + Default,
{
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::Map(self)
    }
}

impl<'b, K, V> MapSlot<'b> for HashMap<K, V>
where
    K: MapKey + Hash + Eq,
    V: FromBson<'b> + Default,
{
    fn begin(&mut self) {
        self.clear();
    }

    fn insert_slot(&mut self, name: &str) -> BsonResult<Slot<'_, 'b>> {
        let key = K::from_name(name)?;
        let value = match self.entry(key) {
            Entry::Occupied(e) => {
                let v = e.into_mut();
                *v = V::default();
                v
            }
            Entry::Vacant(e) => e.insert(V::default()),
        };
        Ok(value.slot())
    }

    fn abort(&mut self, name: &str) {
        if let Ok(key) = K::from_name(name) {
            self.remove(&key);
        }
    }
}

impl<'b, T: FromBson<'b> + Default> FromBson<'b> for Option<T> {
    fn slot(&mut self) -> Slot<'_, 'b> {
        Slot::Nullable(self)
    }
}

impl<'b, T: FromBson<'b> + Default> NullableSlot<'b> for Option<T> {
    fn is_none(&self) -> bool {
        Option::is_none(self)
    }

    fn set_none(&mut self) {
        *self = None;
    }

    fn get_or_insert_slot(&mut self) -> Slot<'_, 'b> {
        self.get_or_insert_with(T::default).slot()
    }
}
