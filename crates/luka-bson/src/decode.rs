//! BSON 解码模块
//!
//! 把一段完整的 BSON 文档字节按目标槽位的形状解码。解码器持有
//! `(缓冲区, 游标)`,文档层逐元素迭代并按目标形状派发,元素层读出
//! 自然类型后经转换矩阵写入槽位;嵌套文档与数组递归回文档层。
//!
//! 两种模式:宽松模式 (默认) 丢弃类型不匹配的元素并继续兄弟元素,
//! 严格模式遇到第一个不匹配即终止;结构性损坏在两种模式下都终止。

use chrono::{Duration, TimeZone, Utc};
use compact_str::CompactString;
use indexmap::IndexMap;
use luka_common::ObjectId;
use url::Url;

use crate::raw::{element_size, RawBson, RawDocEntry, RawOrderedDocument};
use crate::record::{field_index, path_slot, RecordSlot};
use crate::slot::{
    FixedSeqSlot, FromBson, MapSlot, SeqSlot, SetAction, SetBson, Slot,
};
use crate::spec::{
    ElementKind, BINARY_GENERIC, BINARY_OLD, MAX_NESTING_DEPTH, MIN_DOCUMENT_SIZE,
    ZERO_DATETIME_MILLIS,
};
use crate::value::{
    zero_datetime, Binary, BsonValue, DbPointerValue, Decimal128, DocEntry, JavaScriptValue,
    OrderedDocument, RegexValue,
};
use crate::{BsonError, BsonResult};

/// 解码配置
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// 严格模式: 元素与目标形状不匹配时立即报错
    pub strict: bool,
    /// 允许顶层文档之后存在多余字节
    pub allow_trailing: bool,
    /// 最大嵌套深度
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            allow_trailing: false,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// 解码文档为多态值
///
/// # Brief
/// 宽松模式下把一段 BSON 文档解码为 [`BsonValue::Document`]
///
/// # Arguments
/// * `data` - 包含一个完整 BSON 文档的字节切片
///
/// # Returns
/// 成功返回 BsonValue, 失败返回错误
pub fn decode(data: &[u8]) -> BsonResult<BsonValue> {
    let mut value = BsonValue::Null;
    decode_into(data, &mut value)?;
    Ok(value)
}

/// 严格模式版本的 [`decode`]
pub fn decode_strict(data: &[u8]) -> BsonResult<BsonValue> {
    let mut value = BsonValue::Null;
    decode_into_strict(data, &mut value)?;
    Ok(value)
}

/// 解码文档到调用方目标
///
/// # Brief
/// 宽松模式下把 BSON 文档解码进任意实现 [`FromBson`] 的目标
///
/// # Arguments
/// * `data` - 包含一个完整 BSON 文档的字节切片
/// * `out` - 目标位置,解码前由调用方持有
///
/// # Returns
/// 成功返回 Ok(()), 失败返回错误
pub fn decode_into<'b, T: FromBson<'b>>(data: &'b [u8], out: &mut T) -> BsonResult<()> {
    decode_into_with(data, out, DecodeOptions::default())
}

/// 严格模式版本的 [`decode_into`]
pub fn decode_into_strict<'b, T: FromBson<'b>>(data: &'b [u8], out: &mut T) -> BsonResult<()> {
    decode_into_with(
        data,
        out,
        DecodeOptions {
            strict: true,
            ..DecodeOptions::default()
        },
    )
}

/// 带完整配置的解码入口
///
/// 本函数只读取一个文档;除非 `allow_trailing`,文档之后的多余字节
/// 是错误。空输入或短于最小文档长度的输入直接报错。
pub fn decode_into_with<'b, T: FromBson<'b>>(
    data: &'b [u8],
    out: &mut T,
    options: DecodeOptions,
) -> BsonResult<()> {
    if data.len() < MIN_DOCUMENT_SIZE {
        return Err(BsonError::UnexpectedEof);
    }
    let mut decoder = Decoder {
        data,
        pos: 0,
        strict: options.strict,
        depth: 0,
        max_depth: options.max_depth,
    };
    decoder.decode_document_into(out.slot())?;
    if !options.allow_trailing && decoder.pos != data.len() {
        return Err(BsonError::TrailingBytes);
    }
    Ok(())
}

/// 元素的自然内存类型
///
/// 元素层先把载荷读成对应类型标记的自然值,再经转换矩阵写入目标。
/// 字节类自然值零拷贝借用缓冲区,只在写入目标时才复制。
enum Native<'b> {
    Float(f64),
    Str(CompactString),
    Bytes(&'b [u8]),
    Bin(Binary),
    Bool(bool),
    I32(i32),
    I64(i64),
    Timestamp(i64),
    Time(chrono::DateTime<Utc>),
    Duration(Duration),
    Oid(ObjectId),
    Regex(RegexValue),
    DbPointer(DbPointerValue),
    Js(JavaScriptValue),
    Symbol(CompactString),
    Decimal(Decimal128),
    MinKey,
    MaxKey,
    Undefined,
    Nil,
}

/// BSON 解码器
///
/// 内部结构: 游标 + 模式开关。单次解码内单线程使用;不同缓冲区上的
/// 独立解码可以并行。
struct Decoder<'b> {
    data: &'b [u8],
    pos: usize,
    strict: bool,
    depth: usize,
    max_depth: usize,
}

macro_rules! store_int {
    ($p:expr, $native:expr, $t:ty, $kind:expr, $target:expr) => {
        match $native {
            Native::I32(n) => {
                *$p = n as $t;
                Ok(())
            }
            Native::I64(n) | Native::Timestamp(n) => {
                *$p = n as $t;
                Ok(())
            }
            Native::Float(f) => {
                *$p = f as $t;
                Ok(())
            }
            Native::Bool(b) => {
                *$p = b as $t;
                Ok(())
            }
            _ => Err(BsonError::TypeMismatch {
                kind: $kind,
                target: $target,
            }),
        }
    };
}

macro_rules! store_float {
    ($p:expr, $native:expr, $t:ty, $kind:expr, $target:expr) => {
        match $native {
            Native::Float(f) => {
                *$p = f as $t;
                Ok(())
            }
            Native::I32(n) => {
                *$p = n as $t;
                Ok(())
            }
            Native::I64(n) | Native::Timestamp(n) => {
                *$p = n as $t;
                Ok(())
            }
            Native::Bool(b) => {
                *$p = if b { 1.0 } else { 0.0 };
                Ok(())
            }
            _ => Err(BsonError::TypeMismatch {
                kind: $kind,
                target: $target,
            }),
        }
    };
}

impl<'b> Decoder<'b> {
    // ========================================================================
    // 文档解码
    // ========================================================================

    /// 按目标形状解码一个文档
    fn decode_document_into(&mut self, slot: Slot<'_, 'b>) -> BsonResult<()> {
        match slot {
            Slot::Nullable(n) => {
                let was_none = n.is_none();
                let result = {
                    let inner = n.get_or_insert_slot();
                    self.decode_document_into(inner)
                };
                if result.is_err() && was_none {
                    n.set_none();
                }
                result
            }
            Slot::Hook(h) => {
                let raw = self.read_raw(ElementKind::Document as u8)?;
                apply_hook(h, raw)
            }
            Slot::Raw(r) => {
                *r = self.read_raw(ElementKind::Document as u8)?;
                Ok(())
            }
            Slot::Any(v) => {
                let mut doc = IndexMap::new();
                self.decode_map_items(&mut doc)?;
                *v = BsonValue::Document(doc);
                Ok(())
            }
            Slot::Map(m) => self.decode_map_items(m),
            Slot::Record(r) => self.decode_record_items(r),
            Slot::OrderedDoc(d) => self.decode_doc_entries(d),
            Slot::RawOrderedDoc(d) => self.decode_raw_entries(d),
            other => Err(BsonError::UnsupportedTarget(other.type_name())),
        }
    }

    /// 解码文档进映射目标
    fn decode_map_items(&mut self, map: &mut dyn MapSlot<'b>) -> BsonResult<()> {
        let end = self.begin_document()?;
        map.begin();
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            let name = self.read_cstr()?;
            self.check_within(end)?;
            let start = self.pos;
            let result = match map.insert_slot(&name) {
                Ok(slot) => self.decode_element_into(kind, slot),
                Err(e) => return Err(e),
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_type_mismatch() && !self.strict => {
                    map.abort(&name);
                    self.pos = start;
                    self.skip_element(kind)?;
                }
                Err(e) => return Err(e),
            }
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 解码文档进记录目标
    ///
    /// 元素名经预计算的字段索引映射到字段位置;索引外的元素名落入
    /// 兜底映射,没有兜底映射时在两种模式下都静默跳过。
    fn decode_record_items(&mut self, rec: &mut dyn RecordSlot<'b>) -> BsonResult<()> {
        let end = self.begin_document()?;
        rec.reset();
        let index = field_index(rec.record_name(), rec.field_specs());
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            let name = self.read_cstr()?;
            self.check_within(end)?;
            let start = self.pos;
            if let Some(path) = index.lookup(&name) {
                let result = match path_slot(&mut *rec, path) {
                    Ok(slot) => self.decode_element_into(kind, slot),
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => {}
                    Err(e) if e.is_type_mismatch() && !self.strict => {
                        self.pos = start;
                        self.skip_element(kind)?;
                    }
                    Err(e) => return Err(e),
                }
            } else {
                match rec.catch_all() {
                    Some(catch) => {
                        let result = match catch.insert_slot(&name) {
                            Ok(slot) => self.decode_element_into(kind, slot),
                            Err(e) => return Err(e),
                        };
                        match result {
                            Ok(()) => {}
                            Err(e) if e.is_type_mismatch() && !self.strict => {
                                catch.abort(&name);
                                self.pos = start;
                                self.skip_element(kind)?;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    None => self.skip_element(kind)?,
                }
            }
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 解码文档进有序文档目标,按线上顺序保留 (键名, 值) 对
    fn decode_doc_entries(&mut self, out: &mut OrderedDocument) -> BsonResult<()> {
        let end = self.begin_document()?;
        out.0.clear();
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            let name = self.read_cstr()?;
            self.check_within(end)?;
            let start = self.pos;
            let mut value = BsonValue::Null;
            match self.decode_element_into(kind, Slot::Any(&mut value)) {
                Ok(()) => out.0.push(DocEntry { name, value }),
                Err(e) if e.is_type_mismatch() && !self.strict => {
                    self.pos = start;
                    self.skip_element(kind)?;
                }
                Err(e) => return Err(e),
            }
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 解码文档进原始有序文档目标 (逐元素零拷贝)
    fn decode_raw_entries(&mut self, out: &mut RawOrderedDocument<'b>) -> BsonResult<()> {
        let end = self.begin_document()?;
        out.0.clear();
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            let name = self.read_cstr()?;
            self.check_within(end)?;
            let value = self.read_raw(kind)?;
            out.0.push(RawDocEntry { name, value });
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 走完一个文档并丢弃全部元素 (结构仍然校验)
    fn discard_document(&mut self) -> BsonResult<()> {
        let end = self.begin_document()?;
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            self.skip_cstr()?;
            self.check_within(end)?;
            self.skip_element(kind)?;
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 数组元素按目标形状派发
    ///
    /// 数组的线上表示是键为十进制下标的文档,下标一律按字节跳过,
    /// 不解析。
    fn decode_array_into(&mut self, slot: Slot<'_, 'b>) -> BsonResult<()> {
        match slot {
            Slot::Seq(s) => self.decode_array_seq(s),
            Slot::FixedSeq(f) => self.decode_array_fixed(f),
            Slot::Any(v) => {
                let mut items: Vec<BsonValue> = Vec::new();
                self.decode_array_seq(&mut items)?;
                *v = BsonValue::Array(items);
                Ok(())
            }
            Slot::RawOrderedDoc(d) => {
                // 数组进原始有序文档: 丢弃并留空
                d.0.clear();
                self.skip_element(ElementKind::Array as u8)
            }
            other => {
                // 先按多态序列整体读完,再报不匹配,保证元素被消费
                let target = other.type_name();
                let mut items: Vec<BsonValue> = Vec::new();
                self.decode_array_seq(&mut items)?;
                Err(BsonError::TypeMismatch {
                    kind: ElementKind::Array,
                    target,
                })
            }
        }
    }

    /// 解码数组进变长序列目标
    fn decode_array_seq(&mut self, seq: &mut dyn SeqSlot<'b>) -> BsonResult<()> {
        let end = self.begin_document()?;
        seq.begin();
        while self.peek_nonzero()? {
            let kind = self.read_u8()?;
            self.skip_index_name(end)?;
            let start = self.pos;
            let result = {
                let slot = seq.push_slot();
                self.decode_element_into(kind, slot)
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_type_mismatch() && !self.strict => {
                    seq.abort_last();
                    self.pos = start;
                    self.skip_element(kind)?;
                }
                Err(e) => return Err(e),
            }
            self.check_within(end)?;
        }
        self.end_document(end)
    }

    /// 解码数组进定长序列目标,位置按线上顺序填充,长度必须一致
    fn decode_array_fixed(&mut self, arr: &mut dyn FixedSeqSlot<'b>) -> BsonResult<()> {
        let end = self.begin_document()?;
        let expected = arr.len();
        let mut filled = 0;
        while self.peek_nonzero()? {
            if filled >= expected {
                return Err(BsonError::LengthMismatch {
                    expected,
                    actual: filled + 1,
                });
            }
            let kind = self.read_u8()?;
            self.skip_index_name(end)?;
            let start = self.pos;
            let result = {
                let slot = arr.slot_at(filled);
                self.decode_element_into(kind, slot)
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_type_mismatch() && !self.strict => {
                    self.pos = start;
                    self.skip_element(kind)?;
                }
                Err(e) => return Err(e),
            }
            filled += 1;
            self.check_within(end)?;
        }
        if filled != expected {
            return Err(BsonError::LengthMismatch {
                expected,
                actual: filled,
            });
        }
        self.end_document(end)
    }

    /// 读取文档头: 校验长度字段并返回文档结束偏移
    fn begin_document(&mut self) -> BsonResult<usize> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(BsonError::NestingTooDeep(self.max_depth));
        }
        let start = self.pos;
        let len = self.read_i32()? as i64;
        let end = start as i64 + len;
        if end <= self.pos as i64 {
            return Err(BsonError::Corrupted(
                "declared document size is too small".to_string(),
            ));
        }
        if end > self.data.len() as i64 {
            return Err(BsonError::Corrupted(
                "declared document size runs past buffer end".to_string(),
            ));
        }
        let end = end as usize;
        if self.data[end - 1] != 0 {
            return Err(BsonError::Corrupted(
                "document is not zero-terminated".to_string(),
            ));
        }
        Ok(end)
    }

    /// 消费结尾零字节并校验游标正好落在文档末尾
    fn end_document(&mut self, end: usize) -> BsonResult<()> {
        self.pos += 1;
        if self.pos != end {
            return Err(BsonError::Corrupted(
                "document length does not match its content".to_string(),
            ));
        }
        self.depth -= 1;
        Ok(())
    }

    /// 游标处是否为非零字节 (文档未到结尾)
    fn peek_nonzero(&self) -> BsonResult<bool> {
        match self.data.get(self.pos) {
            Some(0) => Ok(false),
            Some(_) => Ok(true),
            None => Err(BsonError::UnexpectedEof),
        }
    }

    /// 元素内容不得越过文档末尾
    fn check_within(&self, end: usize) -> BsonResult<()> {
        if self.pos >= end {
            return Err(BsonError::Corrupted(
                "element runs past document end".to_string(),
            ));
        }
        Ok(())
    }

    /// 跳过数组元素的下标键 (逐字节,不解析)
    fn skip_index_name(&mut self, end: usize) -> BsonResult<()> {
        while self.pos < end && self.data[self.pos] != 0 {
            self.pos += 1;
        }
        if self.pos >= end {
            return Err(BsonError::Corrupted(
                "array index name runs past document end".to_string(),
            ));
        }
        self.pos += 1;
        Ok(())
    }

    // ========================================================================
    // 元素解码
    // ========================================================================

    /// 把一个元素解码进目标槽位
    ///
    /// 派发优先级: 原始槽位 → Option 链 → 嵌套文档 → 钩子 → 数组 →
    /// 自然类型 + 转换矩阵。
    fn decode_element_into(&mut self, kind_byte: u8, slot: Slot<'_, 'b>) -> BsonResult<()> {
        // 原始槽位: 不做任何解释,零拷贝保留元素字节
        let slot = match slot {
            Slot::Raw(r) => {
                *r = self.read_raw(kind_byte)?;
                return Ok(());
            }
            other => other,
        };

        let kind =
            ElementKind::from_u8(kind_byte).ok_or(BsonError::UnknownElementKind(kind_byte))?;

        // Option 链: Null 置空,其余解码进内层,最外层成功才提交
        let slot = match slot {
            Slot::Nullable(n) => {
                if kind == ElementKind::Null {
                    n.set_none();
                    return Ok(());
                }
                let was_none = n.is_none();
                let result = {
                    let inner = n.get_or_insert_slot();
                    self.decode_element_into(kind_byte, inner)
                };
                if result.is_err() && was_none {
                    n.set_none();
                }
                return result;
            }
            other => other,
        };

        if kind == ElementKind::Document {
            return match slot {
                s @ (Slot::Any(_)
                | Slot::Map(_)
                | Slot::Record(_)
                | Slot::OrderedDoc(_)
                | Slot::RawOrderedDoc(_)
                | Slot::Hook(_)) => self.decode_document_into(s),
                // 承载不了文档的槽位: 走完并丢弃
                _ => self.discard_document(),
            };
        }

        // 钩子: 整个元素零拷贝交给目标自行解码
        let slot = match slot {
            Slot::Hook(h) => {
                let raw = self.read_raw(kind_byte)?;
                return apply_hook(h, raw);
            }
            other => other,
        };

        if kind == ElementKind::Array {
            return self.decode_array_into(slot);
        }

        let want_duration = matches!(slot, Slot::Duration(_));
        let native = self.decode_native(kind, want_duration)?;
        self.store_native(native, slot, kind)
    }

    /// 按类型标记读出元素的自然值
    fn decode_native(&mut self, kind: ElementKind, want_duration: bool) -> BsonResult<Native<'b>> {
        Ok(match kind {
            ElementKind::Float64 => Native::Float(self.read_f64()?),
            ElementKind::String => Native::Str(self.read_str()?),
            ElementKind::Binary => {
                let declared = self.read_i32()?;
                if declared < 0 {
                    return Err(BsonError::Corrupted(
                        "binary data size can't be negative".to_string(),
                    ));
                }
                let subtype = self.read_u8()?;
                let mut len = declared;
                if subtype == BINARY_OLD && declared > 4 {
                    // 旧式格式带冗余长度,必须等于外层长度减 4
                    let redundant = self.read_i32()?;
                    if redundant != declared - 4 {
                        return Err(BsonError::Corrupted(
                            "binary-old redundant length mismatch".to_string(),
                        ));
                    }
                    len = redundant;
                }
                let data = self.read_bytes(len as usize)?;
                if subtype == BINARY_GENERIC || subtype == BINARY_OLD {
                    Native::Bytes(data)
                } else {
                    Native::Bin(Binary {
                        subtype,
                        data: data.to_vec(),
                    })
                }
            }
            ElementKind::Undefined => Native::Undefined,
            ElementKind::ObjectId => {
                let bytes = self.read_bytes(12)?;
                let mut arr = [0u8; 12];
                arr.copy_from_slice(bytes);
                Native::Oid(ObjectId::from_bytes(arr))
            }
            ElementKind::Bool => Native::Bool(self.read_bool()?),
            ElementKind::DateTime => {
                let millis = self.read_i64()?;
                if millis == ZERO_DATETIME_MILLIS {
                    Native::Time(zero_datetime())
                } else {
                    let dt = Utc
                        .timestamp_millis_opt(millis)
                        .single()
                        .ok_or_else(|| BsonError::Corrupted("datetime out of range".to_string()))?;
                    Native::Time(dt)
                }
            }
            ElementKind::Null => Native::Nil,
            ElementKind::Regex => {
                let pattern = self.read_cstr()?;
                let options = self.read_cstr()?;
                Native::Regex(RegexValue { pattern, options })
            }
            ElementKind::DbPointer => {
                let namespace = self.read_str()?;
                let bytes = self.read_bytes(12)?;
                let mut arr = [0u8; 12];
                arr.copy_from_slice(bytes);
                Native::DbPointer(DbPointerValue {
                    namespace,
                    id: ObjectId::from_bytes(arr),
                })
            }
            ElementKind::JavaScript => Native::Js(JavaScriptValue {
                code: self.read_str()?,
                scope: None,
            }),
            ElementKind::Symbol => Native::Symbol(self.read_str()?),
            ElementKind::JavaScriptWithScope => {
                // 元素自带总长,作用域解码后游标必须正好前进总长
                let start = self.pos;
                let total = self.read_i32()? as i64;
                let code = self.read_str()?;
                let mut scope = IndexMap::new();
                self.decode_map_items(&mut scope)?;
                if self.pos as i64 != start as i64 + total {
                    return Err(BsonError::Corrupted(
                        "javascript-with-scope length mismatch".to_string(),
                    ));
                }
                Native::Js(JavaScriptValue {
                    code,
                    scope: Some(scope),
                })
            }
            ElementKind::Int32 => Native::I32(self.read_i32()?),
            ElementKind::Timestamp => Native::Timestamp(self.read_i64()?),
            ElementKind::Int64 => {
                let n = self.read_i64()?;
                if want_duration {
                    Native::Duration(Duration::milliseconds(n))
                } else {
                    Native::I64(n)
                }
            }
            ElementKind::Decimal128 => {
                let low = self.read_i64()? as u64;
                let high = self.read_i64()? as u64;
                Native::Decimal(Decimal128 { low, high })
            }
            ElementKind::MinKey => Native::MinKey,
            ElementKind::MaxKey => Native::MaxKey,
            ElementKind::Document | ElementKind::Array => {
                unreachable!("documents and arrays are handled by the document decoder")
            }
        })
    }

    /// 转换矩阵: 把自然值写入目标槽位
    ///
    /// 同形写入总是允许;跨类转换只接受矩阵列出的组合,其余一律
    /// 报类型不匹配。
    fn store_native(
        &mut self,
        native: Native<'b>,
        slot: Slot<'_, 'b>,
        kind: ElementKind,
    ) -> BsonResult<()> {
        // Null 把任何目标重置为零值
        if matches!(native, Native::Nil) {
            return slot.assign_zero();
        }
        let target = slot.type_name();
        let mismatch = || BsonError::TypeMismatch { kind, target };
        match slot {
            Slot::Any(v) => {
                *v = native_to_value(native);
                Ok(())
            }
            Slot::Bool(p) => match native {
                Native::Bool(b) => {
                    *p = b;
                    Ok(())
                }
                Native::I32(n) => {
                    *p = n != 0;
                    Ok(())
                }
                Native::I64(n) | Native::Timestamp(n) => {
                    *p = n != 0;
                    Ok(())
                }
                Native::Float(f) => {
                    *p = f != 0.0;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::I8(p) => store_int!(p, native, i8, kind, target),
            Slot::I16(p) => store_int!(p, native, i16, kind, target),
            Slot::I32(p) => store_int!(p, native, i32, kind, target),
            Slot::I64(p) => store_int!(p, native, i64, kind, target),
            Slot::U8(p) => store_int!(p, native, u8, kind, target),
            Slot::U16(p) => store_int!(p, native, u16, kind, target),
            Slot::U32(p) => store_int!(p, native, u32, kind, target),
            Slot::U64(p) => store_int!(p, native, u64, kind, target),
            Slot::F32(p) => store_float!(p, native, f32, kind, target),
            Slot::F64(p) => store_float!(p, native, f64, kind, target),
            Slot::Str(p) => match native {
                Native::Str(s) | Native::Symbol(s) => {
                    *p = s.into();
                    Ok(())
                }
                Native::Bytes(b) => {
                    *p = std::str::from_utf8(b)?.to_string();
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::JsonNumber(p) => match native {
                Native::I32(n) => {
                    *p = serde_json::Number::from(n);
                    Ok(())
                }
                Native::I64(n) | Native::Timestamp(n) => {
                    *p = serde_json::Number::from(n);
                    Ok(())
                }
                Native::Float(f) => match serde_json::Number::from_f64(f) {
                    Some(n) => {
                        *p = n;
                        Ok(())
                    }
                    None => Err(mismatch()),
                },
                Native::Str(s) | Native::Symbol(s) => {
                    if let Ok(n) = s.parse::<i64>() {
                        *p = serde_json::Number::from(n);
                        Ok(())
                    } else if let Some(n) =
                        s.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
                    {
                        *p = n;
                        Ok(())
                    } else {
                        Err(mismatch())
                    }
                }
                _ => Err(mismatch()),
            },
            Slot::ObjectId(p) => match native {
                Native::Oid(id) => {
                    *p = id;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::DateTime(p) => match native {
                Native::Time(dt) => {
                    *p = dt;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Duration(p) => match native {
                Native::Duration(d) => {
                    *p = d;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Decimal(p) => match native {
                Native::Decimal(d) => {
                    *p = d;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Regex(p) => match native {
                Native::Regex(r) => {
                    *p = r;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::JavaScript(p) => match native {
                Native::Js(js) => {
                    *p = js;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Binary(p) => match native {
                Native::Bin(b) => {
                    *p = b;
                    Ok(())
                }
                Native::Bytes(b) => {
                    *p = Binary {
                        subtype: BINARY_GENERIC,
                        data: b.to_vec(),
                    };
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Url(p) => match native {
                Native::Str(s) | Native::Symbol(s) => {
                    *p = Url::parse(&s)?;
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            Slot::Seq(s) => match native {
                Native::Bytes(b) => fill_byte_seq(s, b, kind),
                Native::Str(st) | Native::Symbol(st) => fill_byte_seq(s, st.as_bytes(), kind),
                _ => Err(mismatch()),
            },
            Slot::FixedSeq(f) => match native {
                Native::Bytes(b) => fill_byte_array(f, b, kind),
                Native::Str(st) | Native::Symbol(st) => fill_byte_array(f, st.as_bytes(), kind),
                _ => Err(mismatch()),
            },
            Slot::Map(_)
            | Slot::Record(_)
            | Slot::OrderedDoc(_)
            | Slot::RawOrderedDoc(_) => Err(mismatch()),
            Slot::Raw(_) | Slot::Nullable(_) | Slot::Hook(_) => {
                unreachable!("raw, option and setter slots are handled before conversion")
            }
        }
    }

    /// 读取整个元素 (类型标记处的载荷) 为零拷贝原始值
    fn read_raw(&mut self, kind_byte: u8) -> BsonResult<RawBson<'b>> {
        let size = element_size(kind_byte, self.pos, self.data)?;
        if self.pos + size > self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        let kind =
            ElementKind::from_u8(kind_byte).ok_or(BsonError::UnknownElementKind(kind_byte))?;
        let data = &self.data[self.pos..self.pos + size];
        self.pos += size;
        Ok(RawBson { kind, data })
    }

    /// 经测长器跳过一个元素的载荷
    fn skip_element(&mut self, kind_byte: u8) -> BsonResult<()> {
        let size = element_size(kind_byte, self.pos, self.data)?;
        if self.pos + size > self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        self.pos += size;
        Ok(())
    }

    // ========================================================================
    // 原语读取
    // ========================================================================

    fn read_u8(&mut self) -> BsonResult<u8> {
        if self.pos >= self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> BsonResult<&'b [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(BsonError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_i32(&mut self) -> BsonResult<i32> {
        let b = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i64(&mut self) -> BsonResult<i64> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_f64(&mut self) -> BsonResult<f64> {
        let b = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_bool(&mut self) -> BsonResult<bool> {
        let byte = self.read_u8()?;
        match byte {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BsonError::Corrupted(format!(
                "encoded boolean must be 0 or 1, found {}",
                other
            ))),
        }
    }

    /// 读取 C 字符串 (至下一个 NUL,含校验的 UTF-8)
    fn read_cstr(&mut self) -> BsonResult<CompactString> {
        let start = self.pos;
        let mut end = start;
        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }
        if end >= self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        let s = CompactString::from_utf8(&self.data[start..end])?;
        self.pos = end + 1;
        Ok(s)
    }

    /// 跳过 C 字符串,不做解码
    fn skip_cstr(&mut self) -> BsonResult<()> {
        let mut end = self.pos;
        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }
        if end >= self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        self.pos = end + 1;
        Ok(())
    }

    /// 读取长度前缀字符串: 4 字节长度 L, L-1 字节内容, 1 字节 NUL
    fn read_str(&mut self) -> BsonResult<CompactString> {
        let len = self.read_i32()? as i64;
        if len < 1 {
            return Err(BsonError::Corrupted(
                "string size can't be less than one byte".to_string(),
            ));
        }
        let bytes = self.read_bytes(len as usize - 1)?;
        if self.read_u8()? != 0 {
            return Err(BsonError::Corrupted(
                "invalid string: not zero-terminated".to_string(),
            ));
        }
        Ok(CompactString::from_utf8(bytes)?)
    }
}

/// 把原始元素交给钩子并处理其响应
fn apply_hook(hook: &mut dyn SetBson, raw: RawBson<'_>) -> BsonResult<()> {
    match hook.set_bson(&raw)? {
        SetAction::Set => Ok(()),
        SetAction::Zero => {
            hook.set_zero();
            Ok(())
        }
    }
}

/// 把字节序列写入元素类型为 u8 的变长序列,其余元素类型不匹配
fn fill_byte_seq(seq: &mut dyn SeqSlot<'_>, bytes: &[u8], kind: ElementKind) -> BsonResult<()> {
    seq.begin();
    let is_bytes = matches!(seq.push_slot(), Slot::U8(_));
    seq.abort_last();
    if !is_bytes {
        return Err(BsonError::TypeMismatch {
            kind,
            target: "sequence",
        });
    }
    for &b in bytes {
        if let Slot::U8(p) = seq.push_slot() {
            *p = b;
        }
    }
    Ok(())
}

/// 把字节序列拷入元素类型为 u8 的定长序列 (按较短长度截断)
fn fill_byte_array(
    arr: &mut dyn FixedSeqSlot<'_>,
    bytes: &[u8],
    kind: ElementKind,
) -> BsonResult<()> {
    if arr.len() == 0 {
        return Ok(());
    }
    if !matches!(arr.slot_at(0), Slot::U8(_)) {
        return Err(BsonError::TypeMismatch {
            kind,
            target: "fixed-length array",
        });
    }
    let n = arr.len().min(bytes.len());
    for (i, &b) in bytes.iter().take(n).enumerate() {
        if let Slot::U8(p) = arr.slot_at(i) {
            *p = b;
        }
    }
    Ok(())
}

/// 自然值对应的多态值
fn native_to_value(native: Native<'_>) -> BsonValue {
    match native {
        Native::Float(f) => BsonValue::Float64(f),
        Native::Str(s) => BsonValue::String(s),
        Native::Bytes(b) => BsonValue::Binary(Binary {
            subtype: BINARY_GENERIC,
            data: b.to_vec(),
        }),
        Native::Bin(b) => BsonValue::Binary(b),
        Native::Bool(b) => BsonValue::Boolean(b),
        Native::I32(n) => BsonValue::Int32(n),
        Native::I64(n) => BsonValue::Int64(n),
        Native::Timestamp(n) => BsonValue::Timestamp(n),
        Native::Time(dt) => BsonValue::DateTime(dt),
        Native::Duration(d) => BsonValue::Int64(d.num_milliseconds()),
        Native::Oid(id) => BsonValue::ObjectId(id),
        Native::Regex(r) => BsonValue::Regex(r),
        Native::DbPointer(p) => BsonValue::DbPointer(p),
        Native::Js(js) => BsonValue::JavaScript(js),
        Native::Symbol(s) => BsonValue::Symbol(s),
        Native::Decimal(d) => BsonValue::Decimal128(d),
        Native::MinKey => BsonValue::MinKey,
        Native::MaxKey => BsonValue::MaxKey,
        Native::Undefined => BsonValue::Undefined,
        Native::Nil => BsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson;
    use crate::record::FieldSpec;

    // ------------------------------------------------------------------
    // 测试用字节构造 (编码方向不在库内,测试自行拼字节)
    // ------------------------------------------------------------------

    fn doc(body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(body.len() + 5);
        out.extend_from_slice(&(body.len() as i32 + 5).to_le_bytes());
        out.extend_from_slice(body);
        out.push(0);
        out
    }

    fn elem(kind: u8, name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![kind];
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(payload);
        out
    }

    fn str_payload(s: &str) -> Vec<u8> {
        let mut out = (s.len() as i32 + 1).to_le_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        out.push(0);
        out
    }

    fn i32_elem(name: &str, v: i32) -> Vec<u8> {
        elem(0x10, name, &v.to_le_bytes())
    }

    fn i64_elem(name: &str, v: i64) -> Vec<u8> {
        elem(0x12, name, &v.to_le_bytes())
    }

    fn f64_elem(name: &str, v: f64) -> Vec<u8> {
        elem(0x01, name, &v.to_le_bytes())
    }

    fn str_elem(name: &str, v: &str) -> Vec<u8> {
        elem(0x02, name, &str_payload(v))
    }

    fn bool_elem(name: &str, v: bool) -> Vec<u8> {
        elem(0x08, name, &[v as u8])
    }

    fn array_elem(name: &str, items: &[Vec<u8>]) -> Vec<u8> {
        elem(0x04, name, &doc(&items.concat()))
    }

    fn doc_elem(name: &str, body: &[u8]) -> Vec<u8> {
        elem(0x03, name, &doc(body))
    }

    // ------------------------------------------------------------------
    // 测试用记录类型
    // ------------------------------------------------------------------

    #[derive(Default, Debug, PartialEq)]
    struct Point {
        a: i32,
    }

    impl<'b> RecordSlot<'b> for Point {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[FieldSpec {
                name: "a",
                path: &[0],
            }]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => Slot::I32(&mut self.a),
                _ => unreachable!(),
            }
        }
    }

    impl<'b> FromBson<'b> for Point {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Record(self)
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Meta {
        city: String,
    }

    impl<'b> RecordSlot<'b> for Meta {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[FieldSpec {
                name: "city",
                path: &[0],
            }]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => Slot::Str(&mut self.city),
                _ => unreachable!(),
            }
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Profile {
        name: String,
        age: i32,
        meta: Meta,
        extra: IndexMap<CompactString, BsonValue>,
    }

    impl<'b> RecordSlot<'b> for Profile {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[
                FieldSpec {
                    name: "name",
                    path: &[0],
                },
                FieldSpec {
                    name: "age",
                    path: &[1],
                },
                // meta 为内联子记录: 其字段出现在顶层
                FieldSpec {
                    name: "city",
                    path: &[2, 0],
                },
            ]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => Slot::Str(&mut self.name),
                1 => Slot::I32(&mut self.age),
                2 => Slot::Record(&mut self.meta),
                _ => unreachable!(),
            }
        }

        fn inline_record(&mut self, position: usize) -> Option<&mut dyn RecordSlot<'b>> {
            match position {
                2 => Some(&mut self.meta),
                _ => None,
            }
        }

        fn catch_all(&mut self) -> Option<&mut dyn MapSlot<'b>> {
            Some(&mut self.extra)
        }
    }

    impl<'b> FromBson<'b> for Profile {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Record(self)
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct MaybeInt {
        a: Option<i32>,
    }

    impl<'b> RecordSlot<'b> for MaybeInt {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[FieldSpec {
                name: "a",
                path: &[0],
            }]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => self.a.slot(),
                _ => unreachable!(),
            }
        }
    }

    impl<'b> FromBson<'b> for MaybeInt {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Record(self)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Misc {
        link: Url,
        wait: Duration,
        num: serde_json::Number,
    }

    impl Default for Misc {
        fn default() -> Self {
            Self {
                link: Url::parse("http://localhost/").unwrap(),
                wait: Duration::zero(),
                num: serde_json::Number::from(0),
            }
        }
    }

    impl<'b> RecordSlot<'b> for Misc {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[
                FieldSpec {
                    name: "link",
                    path: &[0],
                },
                FieldSpec {
                    name: "wait",
                    path: &[1],
                },
                FieldSpec {
                    name: "num",
                    path: &[2],
                },
            ]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => Slot::Url(&mut self.link),
                1 => Slot::Duration(&mut self.wait),
                2 => Slot::JsonNumber(&mut self.num),
                _ => unreachable!(),
            }
        }
    }

    impl<'b> FromBson<'b> for Misc {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Record(self)
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct RawField<'b> {
        s: RawBson<'b>,
    }

    impl<'b> RecordSlot<'b> for RawField<'b> {
        fn record_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn field_specs(&self) -> &'static [FieldSpec] {
            &[FieldSpec {
                name: "s",
                path: &[0],
            }]
        }

        fn reset(&mut self) {
            *self = Self::default();
        }

        fn field_slot(&mut self, position: usize) -> Slot<'_, 'b> {
            match position {
                0 => Slot::Raw(&mut self.s),
                _ => unreachable!(),
            }
        }
    }

    impl<'b> FromBson<'b> for RawField<'b> {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Record(self)
        }
    }

    // ------------------------------------------------------------------
    // 测试用钩子类型
    // ------------------------------------------------------------------

    #[derive(Default, Debug, PartialEq)]
    struct KindGrabber {
        seen: Option<(ElementKind, usize)>,
    }

    impl SetBson for KindGrabber {
        fn set_bson(&mut self, raw: &RawBson<'_>) -> BsonResult<SetAction> {
            match raw.kind {
                ElementKind::String => Ok(SetAction::Zero),
                ElementKind::Bool => Err(BsonError::TypeMismatch {
                    kind: raw.kind,
                    target: "kind grabber",
                }),
                _ => {
                    self.seen = Some((raw.kind, raw.data.len()));
                    Ok(SetAction::Set)
                }
            }
        }

        fn set_zero(&mut self) {
            *self = Self::default();
        }
    }

    impl<'b> FromBson<'b> for KindGrabber {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Hook(self)
        }
    }

    #[derive(Default)]
    struct FailingHook;

    impl SetBson for FailingHook {
        fn set_bson(&mut self, _raw: &RawBson<'_>) -> BsonResult<SetAction> {
            Err(BsonError::Setter("boom".to_string()))
        }

        fn set_zero(&mut self) {}
    }

    impl<'b> FromBson<'b> for FailingHook {
        fn slot(&mut self) -> Slot<'_, 'b> {
            Slot::Hook(self)
        }
    }

    // ------------------------------------------------------------------
    // 基础解码
    // ------------------------------------------------------------------

    #[test]
    fn test_decode_hello_world() {
        let bytes = doc(&str_elem("hello", "world"));
        assert_eq!(
            bytes,
            [
                0x16, 0x00, 0x00, 0x00, 0x02, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, 0x06, 0x00,
                0x00, 0x00, 0x77, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x00
            ]
        );

        let value = decode(&bytes).unwrap();
        assert_eq!(value, bson!({ "hello": "world" }));

        let mut map: IndexMap<String, String> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["hello"], "world");
    }

    #[test]
    fn test_minimum_document() {
        let bytes = [0x05, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode(&bytes).unwrap(), bson!({}));

        let mut map: IndexMap<String, i32> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert!(map.is_empty());

        let mut point = Point { a: 9 };
        decode_into(&bytes, &mut point).unwrap();
        assert_eq!(point, Point::default());
    }

    #[test]
    fn test_empty_and_truncated_input() {
        assert!(matches!(decode(&[]), Err(BsonError::UnexpectedEof)));
        assert!(matches!(
            decode(&[0x05, 0x00]),
            Err(BsonError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_corrupted_length_fields() {
        // 长度字段 <= 4
        assert!(matches!(
            decode(&[0x04, 0x00, 0x00, 0x00, 0x00]),
            Err(BsonError::Corrupted(_))
        ));
        // 长度超出缓冲区
        assert!(matches!(
            decode(&[0x0A, 0x00, 0x00, 0x00, 0x00]),
            Err(BsonError::Corrupted(_))
        ));
        // 结尾字节非零
        assert!(matches!(
            decode(&[0x05, 0x00, 0x00, 0x00, 0x01]),
            Err(BsonError::Corrupted(_))
        ));
    }

    #[test]
    fn test_bool_byte_two_is_corrupted_in_both_modes() {
        let bytes = doc(&elem(0x08, "b", &[2]));
        assert!(matches!(decode(&bytes), Err(BsonError::Corrupted(_))));
        assert!(matches!(decode_strict(&bytes), Err(BsonError::Corrupted(_))));
    }

    #[test]
    fn test_unknown_kind_is_fatal_in_both_modes() {
        let bytes = doc(&elem(0x42, "k", &[0, 0, 0, 0]));
        assert!(matches!(
            decode(&bytes),
            Err(BsonError::UnknownElementKind(0x42))
        ));
        assert!(matches!(
            decode_strict(&bytes),
            Err(BsonError::UnknownElementKind(0x42))
        ));
        // 记录目标中未匹配的名字也无法跳过未知类型
        let mut point = Point::default();
        assert!(matches!(
            decode_into(&doc(&elem(0x42, "zzz", &[])), &mut point),
            Err(BsonError::UnknownElementKind(0x42))
        ));
    }

    #[test]
    fn test_string_length_errors() {
        // 长度字段为 0
        let bytes = doc(&elem(0x02, "s", &[0x00, 0x00, 0x00, 0x00]));
        assert!(matches!(decode(&bytes), Err(BsonError::Corrupted(_))));
        // 缺失结尾 NUL
        let bytes = doc(&elem(0x02, "s", &[0x03, 0x00, 0x00, 0x00, b'h', b'i', b'!']));
        assert!(matches!(decode(&bytes), Err(BsonError::Corrupted(_))));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = doc(&i32_elem("a", 1));
        bytes.push(0xFF);
        let mut value = BsonValue::Null;
        assert!(matches!(
            decode_into(&bytes, &mut value),
            Err(BsonError::TrailingBytes)
        ));
        decode_into_with(
            &bytes,
            &mut value,
            DecodeOptions {
                allow_trailing: true,
                ..DecodeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(value, bson!({ "a": 1 }));
    }

    // ------------------------------------------------------------------
    // 记录目标
    // ------------------------------------------------------------------

    #[test]
    fn test_record_unmapped_name_is_skipped_in_both_modes() {
        let bytes = doc(&[i32_elem("a", 1), i32_elem("b", 2)].concat());
        assert_eq!(
            bytes,
            [
                0x13, 0x00, 0x00, 0x00, 0x10, 0x61, 0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x62,
                0x00, 0x02, 0x00, 0x00, 0x00, 0x00
            ]
        );

        let mut point = Point::default();
        decode_into(&bytes, &mut point).unwrap();
        assert_eq!(point.a, 1);

        // 严格模式下未匹配的名字同样静默跳过,不报错
        let mut point = Point::default();
        decode_into_strict(&bytes, &mut point).unwrap();
        assert_eq!(point.a, 1);
    }

    #[test]
    fn test_record_type_mismatch_lenient_vs_strict() {
        let bytes = doc(&str_elem("a", "not a number"));
        let mut point = Point { a: 7 };
        decode_into(&bytes, &mut point).unwrap();
        // 目标先重置为零值,不匹配的元素被丢弃
        assert_eq!(point.a, 0);

        let mut point = Point::default();
        assert!(matches!(
            decode_into_strict(&bytes, &mut point),
            Err(BsonError::TypeMismatch { target: "i32", .. })
        ));
    }

    #[test]
    fn test_record_inline_and_catch_all() {
        let bytes = doc(&[
            str_elem("name", "luka"),
            i32_elem("age", 16),
            str_elem("city", "Sapporo"),
            bool_elem("vip", true),
        ]
        .concat());
        let mut profile = Profile::default();
        decode_into(&bytes, &mut profile).unwrap();
        assert_eq!(profile.name, "luka");
        assert_eq!(profile.age, 16);
        assert_eq!(profile.meta.city, "Sapporo");
        assert_eq!(profile.extra.len(), 1);
        assert_eq!(profile.extra["vip"], BsonValue::Boolean(true));
    }

    #[test]
    fn test_record_is_reset_before_population() {
        let mut profile = Profile {
            name: "old".to_string(),
            age: 99,
            meta: Meta {
                city: "gone".to_string(),
            },
            extra: IndexMap::new(),
        };
        decode_into(&doc(&str_elem("name", "new")), &mut profile).unwrap();
        assert_eq!(profile.name, "new");
        assert_eq!(profile.age, 0);
        assert_eq!(profile.meta.city, "");
    }

    #[test]
    fn test_repeat_keys_last_write_wins() {
        let bytes = doc(&[i32_elem("a", 1), i32_elem("a", 2)].concat());
        let mut point = Point::default();
        decode_into(&bytes, &mut point).unwrap();
        assert_eq!(point.a, 2);

        let mut map: IndexMap<String, i32> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], 2);
    }

    #[test]
    fn test_document_into_scalar_field_is_discarded() {
        let bytes = doc(&doc_elem("a", &i32_elem("x", 1)));
        let mut point = Point { a: 5 };
        // 承载不了文档的槽位: 走完并丢弃,两种模式下都不报错
        decode_into_strict(&bytes, &mut point).unwrap();
        assert_eq!(point.a, 0);
    }

    #[test]
    fn test_unsupported_top_level_target() {
        let mut n = 0i32;
        assert!(matches!(
            decode_into(&doc(&[]), &mut n),
            Err(BsonError::UnsupportedTarget("i32"))
        ));
    }

    // ------------------------------------------------------------------
    // 映射目标
    // ------------------------------------------------------------------

    #[test]
    fn test_map_is_cleared_before_population() {
        let mut map: IndexMap<String, i32> = IndexMap::new();
        map.insert("stale".to_string(), 1);
        decode_into(&doc(&i32_elem("fresh", 2)), &mut map).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["fresh"], 2);
    }

    #[test]
    fn test_map_numeric_keys() {
        let bytes = doc(&[i32_elem("1", 10), i32_elem("2", 20)].concat());
        let mut map: IndexMap<i32, i32> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map[&1], 10);
        assert_eq!(map[&2], 20);

        // 键名解析失败是致命错误,宽松模式也不放过
        let bytes = doc(&i32_elem("oops", 1));
        let mut map: IndexMap<i32, i32> = IndexMap::new();
        assert!(matches!(
            decode_into(&bytes, &mut map),
            Err(BsonError::InvalidMapKey(_))
        ));
    }

    #[test]
    fn test_map_mismatch_lenient_drops_entry() {
        let bytes = doc(&[str_elem("a", "x"), i32_elem("b", 2)].concat());
        let mut map: IndexMap<String, i32> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["b"], 2);

        let mut map: IndexMap<String, i32> = IndexMap::new();
        assert!(matches!(
            decode_into_strict(&bytes, &mut map),
            Err(BsonError::TypeMismatch { .. })
        ));
    }

    // ------------------------------------------------------------------
    // 数组
    // ------------------------------------------------------------------

    #[test]
    fn test_array_into_vec() {
        let bytes = doc(&array_elem(
            "a",
            &[i32_elem("0", 1), i32_elem("1", 2), i32_elem("2", 3)],
        ));
        let mut map: IndexMap<String, Vec<i32>> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["a"], vec![1, 2, 3]);
    }

    #[test]
    fn test_array_index_names_are_ignored() {
        // 下标键只按字节跳过,错乱的下标不影响填充顺序
        let bytes = doc(&array_elem(
            "a",
            &[i32_elem("9", 1), i32_elem("bogus", 2), i32_elem("", 3)],
        ));
        let mut map: IndexMap<String, Vec<i32>> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["a"], vec![1, 2, 3]);
    }

    #[test]
    fn test_array_into_fixed_length() {
        let bytes = doc(&array_elem(
            "a",
            &[i32_elem("0", 10), i32_elem("1", 20), i32_elem("2", 30)],
        ));
        let mut map: IndexMap<String, [i32; 3]> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["a"], [10, 20, 30]);

        // 长度不一致是致命错误,宽松模式也不放过
        let mut short: IndexMap<String, [i32; 2]> = IndexMap::new();
        assert!(matches!(
            decode_into(&bytes, &mut short),
            Err(BsonError::LengthMismatch {
                expected: 2,
                actual: 3
            })
        ));
        let mut long: IndexMap<String, [i32; 4]> = IndexMap::new();
        assert!(matches!(
            decode_into(&bytes, &mut long),
            Err(BsonError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_array_lenient_drops_mismatched_element() {
        let bytes = doc(&array_elem(
            "a",
            &[i32_elem("0", 1), str_elem("1", "x"), i32_elem("2", 3)],
        ));
        let mut map: IndexMap<String, Vec<i32>> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["a"], vec![1, 3]);

        let mut map: IndexMap<String, Vec<i32>> = IndexMap::new();
        assert!(matches!(
            decode_into_strict(&bytes, &mut map),
            Err(BsonError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_into_any_and_into_scalar() {
        let bytes = doc(&array_elem("a", &[i32_elem("0", 1), str_elem("1", "x")]));
        let value = decode(&bytes).unwrap();
        assert_eq!(value, bson!({ "a": [1, "x"] }));

        // 数组进标量槽位: 整体消费后报不匹配,宽松模式丢弃
        let mut point = Point { a: 3 };
        decode_into(&doc(&array_elem("a", &[i32_elem("0", 1)])), &mut point).unwrap();
        assert_eq!(point.a, 0);
    }

    // ------------------------------------------------------------------
    // 日期时间与特殊标量
    // ------------------------------------------------------------------

    #[test]
    fn test_datetime_zero_sentinel() {
        let millis: i64 = -62_135_596_800_000;
        let payload = millis.to_le_bytes();
        assert_eq!(payload, [0x00, 0x24, 0x88, 0x8C, 0xF7, 0xFF, 0xFF, 0xFF]);
        let bytes = doc(&elem(0x09, "t", &payload));
        let value = decode(&bytes).unwrap();
        assert_eq!(value.get("t"), Some(&BsonValue::DateTime(zero_datetime())));
    }

    #[test]
    fn test_datetime_regular_millis() {
        let bytes = doc(&elem(0x09, "t", &1_000i64.to_le_bytes()));
        let value = decode(&bytes).unwrap();
        let expected = Utc.timestamp_millis_opt(1_000).single().unwrap();
        assert_eq!(value.get("t"), Some(&BsonValue::DateTime(expected)));
    }

    #[test]
    fn test_timestamp_minkey_maxkey_undefined_into_any() {
        let bytes = doc(&[
            elem(0x11, "ts", &42i64.to_le_bytes()),
            elem(0xFF, "min", &[]),
            elem(0x7F, "max", &[]),
            elem(0x06, "u", &[]),
            elem(0x0A, "n", &[]),
        ]
        .concat());
        let value = decode(&bytes).unwrap();
        assert_eq!(value.get("ts"), Some(&BsonValue::Timestamp(42)));
        assert_eq!(value.get("min"), Some(&BsonValue::MinKey));
        assert_eq!(value.get("max"), Some(&BsonValue::MaxKey));
        assert_eq!(value.get("u"), Some(&BsonValue::Undefined));
        assert_eq!(value.get("n"), Some(&BsonValue::Null));
    }

    #[test]
    fn test_regex_symbol_dbpointer_decimal_into_any() {
        let mut dbptr = str_payload("db.coll");
        dbptr.extend_from_slice(&[7u8; 12]);
        let mut decimal = 1u64.to_le_bytes().to_vec();
        decimal.extend_from_slice(&2u64.to_le_bytes());
        let bytes = doc(&[
            elem(0x0B, "re", b"ab*\x00i\x00"),
            elem(0x0E, "sym", &str_payload("tag")),
            elem(0x0C, "ptr", &dbptr),
            elem(0x13, "dec", &decimal),
        ]
        .concat());
        let value = decode(&bytes).unwrap();
        assert_eq!(
            value.get("re"),
            Some(&BsonValue::Regex(RegexValue {
                pattern: "ab*".into(),
                options: "i".into(),
            }))
        );
        assert_eq!(value.get("sym"), Some(&BsonValue::Symbol("tag".into())));
        assert_eq!(
            value.get("ptr"),
            Some(&BsonValue::DbPointer(DbPointerValue {
                namespace: "db.coll".into(),
                id: ObjectId::from_bytes([7; 12]),
            }))
        );
        assert_eq!(
            value.get("dec"),
            Some(&BsonValue::Decimal128(Decimal128 { low: 1, high: 2 }))
        );
    }

    #[test]
    fn test_objectid_element() {
        let bytes = doc(&elem(0x07, "id", &[3u8; 12]));
        let mut map: IndexMap<String, ObjectId> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["id"], ObjectId::from_bytes([3; 12]));
    }

    // ------------------------------------------------------------------
    // 二进制
    // ------------------------------------------------------------------

    #[test]
    fn test_binary_old_yields_naked_bytes() {
        let payload = [
            0x08, 0x00, 0x00, 0x00, 0x02, 0x04, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF,
        ];
        let bytes = doc(&elem(0x05, "b", &payload));
        let mut map: IndexMap<String, Vec<u8>> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["b"], vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_binary_old_redundant_length_mismatch_is_corrupted() {
        let payload = [
            0x08, 0x00, 0x00, 0x00, 0x02, 0x05, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF,
        ];
        let bytes = doc(&elem(0x05, "b", &payload));
        assert!(matches!(decode(&bytes), Err(BsonError::Corrupted(_))));
    }

    #[test]
    fn test_binary_user_defined_keeps_wrapper() {
        let payload = [0x02, 0x00, 0x00, 0x00, 0x80, 0xDE, 0xAD];
        let bytes = doc(&elem(0x05, "b", &payload));
        let mut map: IndexMap<String, Binary> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(
            map["b"],
            Binary {
                subtype: 0x80,
                data: vec![0xDE, 0xAD],
            }
        );
        // 用户自定义子类型进字节序列目标: 不匹配
        let mut map: IndexMap<String, Vec<u8>> = IndexMap::new();
        assert!(matches!(
            decode_into_strict(&bytes, &mut map),
            Err(BsonError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_binary_generic_conversions() {
        let payload = [0x02, 0x00, 0x00, 0x00, 0x00, b'h', b'i'];
        let bytes = doc(&elem(0x05, "b", &payload));
        // 进字符串目标: 按 UTF-8 解释
        let mut map: IndexMap<String, String> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["b"], "hi");
        // 进二进制结构目标: 以默认子类型包装
        let mut map: IndexMap<String, Binary> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(
            map["b"],
            Binary {
                subtype: BINARY_GENERIC,
                data: b"hi".to_vec(),
            }
        );
        // 进定长字节数组: 按较短长度拷贝
        let mut map: IndexMap<String, [u8; 4]> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["b"], [b'h', b'i', 0, 0]);
    }

    #[test]
    fn test_string_into_byte_sequence() {
        let bytes = doc(&str_elem("s", "hi"));
        let mut map: IndexMap<String, Vec<u8>> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["s"], b"hi".to_vec());

        // 字符串进非字节序列: 不匹配
        let mut map: IndexMap<String, Vec<i32>> = IndexMap::new();
        assert!(matches!(
            decode_into_strict(&bytes, &mut map),
            Err(BsonError::TypeMismatch { .. })
        ));
    }

    // ------------------------------------------------------------------
    // 转换矩阵
    // ------------------------------------------------------------------

    #[test]
    fn test_numeric_conversions() {
        let bytes = doc(&[
            f64_elem("f", 3.9),
            i32_elem("i", 7),
            bool_elem("b", true),
            i64_elem("l", -1),
        ]
        .concat());

        // 浮点进整数: 向零截断
        let mut map: IndexMap<String, i32> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["f"], 3);
        assert_eq!(map["i"], 7);
        assert_eq!(map["b"], 1);
        assert_eq!(map["l"], -1);

        // 整数与布尔进浮点
        let mut map: IndexMap<String, f64> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["f"], 3.9);
        assert_eq!(map["i"], 7.0);
        assert_eq!(map["b"], 1.0);

        // 非零进布尔
        let mut map: IndexMap<String, bool> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert!(map["f"]);
        assert!(map["i"]);
        assert!(map["b"]);
        assert!(map["l"]);
    }

    #[test]
    fn test_null_resets_target_to_zero() {
        let bytes = doc(&elem(0x0A, "a", &[]));
        let mut point = Point { a: 9 };
        decode_into(&bytes, &mut point).unwrap();
        assert_eq!(point.a, 0);

        let mut map: IndexMap<String, String> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["a"], "");
    }

    #[test]
    fn test_int64_into_duration_is_milliseconds() {
        let bytes = doc(&[
            str_elem("link", "https://example.com/x"),
            i64_elem("wait", 1_500),
            f64_elem("num", 2.5),
        ]
        .concat());
        let mut misc = Misc::default();
        decode_into(&bytes, &mut misc).unwrap();
        assert_eq!(misc.wait, Duration::milliseconds(1_500));
        assert_eq!(misc.link.as_str(), "https://example.com/x");
        assert_eq!(misc.num, serde_json::Number::from_f64(2.5).unwrap());
    }

    #[test]
    fn test_url_parse_failure_is_fatal() {
        let bytes = doc(&str_elem("link", "not a url"));
        let mut misc = Misc::default();
        assert!(matches!(
            decode_into(&bytes, &mut misc),
            Err(BsonError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_json_number_from_string() {
        let bytes = doc(&str_elem("num", "123"));
        let mut misc = Misc::default();
        decode_into(&bytes, &mut misc).unwrap();
        assert_eq!(misc.num, serde_json::Number::from(123));
    }

    // ------------------------------------------------------------------
    // Option 链
    // ------------------------------------------------------------------

    #[test]
    fn test_option_commit_on_success_only() {
        let mut target = MaybeInt::default();
        decode_into(&doc(&i32_elem("a", 5)), &mut target).unwrap();
        assert_eq!(target.a, Some(5));

        // Null 置空
        decode_into(&doc(&elem(0x0A, "a", &[])), &mut target).unwrap();
        assert_eq!(target.a, None);

        // 失败的解码不留下已分配的 Some
        decode_into(&doc(&str_elem("a", "x")), &mut target).unwrap();
        assert_eq!(target.a, None);
    }

    // ------------------------------------------------------------------
    // 钩子
    // ------------------------------------------------------------------

    #[test]
    fn test_hook_receives_raw_element() {
        let bytes = doc(&i32_elem("h", 77));
        let mut map: IndexMap<String, KindGrabber> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["h"].seen, Some((ElementKind::Int32, 4)));

        // 文档元素整体交给钩子 (含长度前缀与结尾零字节)
        let inner = doc(&i32_elem("x", 1));
        let bytes = doc(&elem(0x03, "h", &inner));
        let mut map: IndexMap<String, KindGrabber> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["h"].seen, Some((ElementKind::Document, inner.len())));
    }

    #[test]
    fn test_hook_set_zero() {
        // 先写入,再由字符串元素触发置零
        let bytes = doc(&[i32_elem("h", 1), str_elem("h", "reset")].concat());
        let mut map: IndexMap<String, KindGrabber> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert_eq!(map["h"], KindGrabber::default());
    }

    #[test]
    fn test_hook_type_mismatch_follows_mode() {
        let bytes = doc(&bool_elem("h", true));
        let mut map: IndexMap<String, KindGrabber> = IndexMap::new();
        decode_into(&bytes, &mut map).unwrap();
        assert!(map.is_empty());

        let mut map: IndexMap<String, KindGrabber> = IndexMap::new();
        assert!(matches!(
            decode_into_strict(&bytes, &mut map),
            Err(BsonError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hook_other_error_is_fatal_even_lenient() {
        let bytes = doc(&i32_elem("h", 1));
        let mut map: IndexMap<String, FailingHook> = IndexMap::new();
        assert!(matches!(
            decode_into(&bytes, &mut map),
            Err(BsonError::Setter(_))
        ));
    }

    // ------------------------------------------------------------------
    // 原始与有序目标
    // ------------------------------------------------------------------

    #[test]
    fn test_raw_field_borrows_exact_bytes() {
        let bytes = doc(&[str_elem("s", "world"), i32_elem("n", 1)].concat());
        let mut target = RawField::default();
        decode_into(&bytes, &mut target).unwrap();
        assert_eq!(target.s.kind, ElementKind::String);
        assert_eq!(target.s.data, &str_payload("world")[..]);
    }

    #[test]
    fn test_raw_top_level_document() {
        let bytes = doc(&i32_elem("a", 1));
        let mut raw = RawBson::default();
        decode_into(&bytes, &mut raw).unwrap();
        assert_eq!(raw.kind, ElementKind::Document);
        assert_eq!(raw.data, &bytes[..]);
    }

    #[test]
    fn test_ordered_document_preserves_order_and_repeats() {
        let bytes = doc(&[
            i32_elem("b", 1),
            i32_elem("a", 2),
            i32_elem("b", 3),
        ]
        .concat());
        let mut ordered = OrderedDocument::default();
        decode_into(&bytes, &mut ordered).unwrap();
        let names: Vec<&str> = ordered.0.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "b"]);
        assert_eq!(ordered.0[2].value, BsonValue::Int32(3));
    }

    #[test]
    fn test_raw_ordered_document() {
        let bytes = doc(&[str_elem("s", "v"), i32_elem("n", 7)].concat());
        let mut raw = RawOrderedDocument::default();
        decode_into(&bytes, &mut raw).unwrap();
        assert_eq!(raw.0.len(), 2);
        assert_eq!(raw.0[0].name, "s");
        assert_eq!(raw.0[0].value.kind, ElementKind::String);
        assert_eq!(raw.0[1].value.data, &7i32.to_le_bytes()[..]);
    }

    // ------------------------------------------------------------------
    // JavaScript 与嵌套
    // ------------------------------------------------------------------

    #[test]
    fn test_javascript_without_scope() {
        let bytes = doc(&elem(0x0D, "js", &str_payload("x = 1")));
        let value = decode(&bytes).unwrap();
        assert_eq!(
            value.get("js"),
            Some(&BsonValue::JavaScript(JavaScriptValue {
                code: "x = 1".into(),
                scope: None,
            }))
        );
    }

    #[test]
    fn test_javascript_with_scope() {
        let code = str_payload("x = n");
        let scope = doc(&i32_elem("n", 4));
        let total = (4 + code.len() + scope.len()) as i32;
        let mut payload = total.to_le_bytes().to_vec();
        payload.extend_from_slice(&code);
        payload.extend_from_slice(&scope);
        let bytes = doc(&elem(0x0F, "js", &payload));

        let value = decode(&bytes).unwrap();
        let mut expected_scope = IndexMap::new();
        expected_scope.insert(CompactString::from("n"), BsonValue::Int32(4));
        assert_eq!(
            value.get("js"),
            Some(&BsonValue::JavaScript(JavaScriptValue {
                code: "x = n".into(),
                scope: Some(expected_scope),
            }))
        );
    }

    #[test]
    fn test_javascript_with_scope_length_mismatch_is_corrupted() {
        let code = str_payload("x");
        let scope = doc(&[]);
        let total = (4 + code.len() + scope.len()) as i32 + 1;
        let mut payload = total.to_le_bytes().to_vec();
        payload.extend_from_slice(&code);
        payload.extend_from_slice(&scope);
        // 声明长度与实际消费不一致
        let mut body = elem(0x0F, "js", &payload);
        body.push(0xEE);
        let bytes = doc(&body);
        assert!(matches!(decode(&bytes), Err(BsonError::Corrupted(_))));
    }

    #[test]
    fn test_round_trip_structure_into_any() {
        let bytes = doc(&[
            f64_elem("x", 3.14),
            array_elem("y", &[i32_elem("0", 1), i32_elem("1", 2), i32_elem("2", 3)]),
            doc_elem("z", &bool_elem("w", true)),
        ]
        .concat());
        let value = decode(&bytes).unwrap();
        assert_eq!(
            value,
            bson!({ "x": 3.14, "y": [1, 2, 3], "z": { "w": true } })
        );
    }

    #[test]
    fn test_nesting_too_deep() {
        let mut body: Vec<u8> = Vec::new();
        for _ in 0..120 {
            body = doc_elem("d", &body);
        }
        let bytes = doc(&body);
        assert!(matches!(
            decode(&bytes),
            Err(BsonError::NestingTooDeep(_))
        ));

        // 深度上限可以放宽
        let mut value = BsonValue::Null;
        decode_into_with(
            &bytes,
            &mut value,
            DecodeOptions {
                max_depth: 200,
                ..DecodeOptions::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_nested_any_takes_default_document_shape() {
        let bytes = doc(&doc_elem("outer", &doc_elem("inner", &i32_elem("x", 1))));
        let value = decode(&bytes).unwrap();
        match value.get_path("outer.inner") {
            Some(BsonValue::Document(doc)) => assert_eq!(doc["x"], BsonValue::Int32(1)),
            other => panic!("expected nested document, got {:?}", other),
        }
    }
}
