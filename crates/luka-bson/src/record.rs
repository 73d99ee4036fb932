//! 记录目标模块
//!
//! 命名字段目标(结构体)的形状接口与字段索引。每个记录类型声明
//! 一次字段表,解码器据此把元素名映射到字段位置;索引按类型名
//! 全局缓存,读写锁保护,构建一次后进程内共享。

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::slot::{MapSlot, Slot};
use crate::{BsonError, BsonResult};

/// 记录字段声明
///
/// `path` 是从记录根出发的字段位置链:长度为 1 表示直接字段,更长
/// 的链经由内联子记录逐层下钻(链上除最后一项外都必须指向子记录)。
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// 线上元素名
    pub name: &'static str,
    /// 字段位置链
    pub path: &'static [usize],
}

/// 预计算的字段索引: 元素名 -> 字段位置链
#[derive(Debug)]
pub struct FieldIndex {
    by_name: HashMap<&'static str, &'static [usize]>,
}

impl FieldIndex {
    fn build(specs: &'static [FieldSpec]) -> Self {
        let mut by_name = HashMap::with_capacity(specs.len());
        for spec in specs {
            by_name.insert(spec.name, spec.path);
        }
        FieldIndex { by_name }
    }

    /// 查找元素名对应的字段位置链
    pub fn lookup(&self, name: &str) -> Option<&'static [usize]> {
        self.by_name.get(name).copied()
    }
}

/// 记录目标的形状接口
///
/// 解码器进入记录目标时先 `reset` 到零值原型,再逐元素经字段索引
/// 派发;索引中不存在的元素名落入 `catch_all` 映射,没有兜底映射
/// 时直接跳过。
pub trait RecordSlot<'b> {
    /// 记录类型名,作为字段索引的缓存键 (通常为 `std::any::type_name`)
    fn record_name(&self) -> &'static str;

    /// 字段声明表
    fn field_specs(&self) -> &'static [FieldSpec];

    /// 重置为零值原型
    fn reset(&mut self);

    /// 位置 `position` 处字段的槽位
    fn field_slot(&mut self, position: usize) -> Slot<'_, 'b>;

    /// 位置 `position` 处的内联子记录 (字段位置链下钻用)
    fn inline_record(&mut self, _position: usize) -> Option<&mut dyn RecordSlot<'b>> {
        None
    }

    /// 吸收未匹配元素名的兜底映射
    fn catch_all(&mut self) -> Option<&mut dyn MapSlot<'b>> {
        None
    }
}

static FIELD_INDEX_CACHE: OnceLock<RwLock<HashMap<&'static str, &'static FieldIndex>>> =
    OnceLock::new();

fn cache() -> &'static RwLock<HashMap<&'static str, &'static FieldIndex>> {
    FIELD_INDEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// 获取记录类型的字段索引
///
/// # Brief
/// 读锁命中则直接返回;未命中时在写锁内构建并泄漏为 'static,
/// 每个记录类型只构建一次
///
/// # Arguments
/// * `key` - 记录类型名 (缓存键)
/// * `specs` - 该类型的字段声明表
///
/// # Returns
/// 进程级共享的字段索引
pub fn field_index(key: &'static str, specs: &'static [FieldSpec]) -> &'static FieldIndex {
    if let Some(index) = cache().read().get(key).copied() {
        return index;
    }
    let mut write = cache().write();
    *write
        .entry(key)
        .or_insert_with(|| &*Box::leak(Box::new(FieldIndex::build(specs))))
}

/// 沿字段位置链取得最终槽位
pub(crate) fn path_slot<'t, 'b>(
    rec: &'t mut dyn RecordSlot<'b>,
    path: &[usize],
) -> BsonResult<Slot<'t, 'b>> {
    let (last, rest) = path
        .split_last()
        .ok_or(BsonError::UnsupportedTarget("empty field path"))?;
    let mut cur = rec;
    for &position in rest {
        cur = cur.inline_record(position).ok_or(BsonError::UnsupportedTarget(
            "inline field path does not resolve to a record",
        ))?;
    }
    Ok(cur.field_slot(*last))
}
