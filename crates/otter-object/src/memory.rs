//! Memory usage estimation.
//!
//! [`estimate`] walks an object graph through raw storage only (no getters,
//! traps or other user code run) and sums fixed per-kind costs. Objects with
//! more own properties than the configured threshold are sampled: the first
//! `threshold` entries in key order are costed exactly and the sum is scaled
//! to the full count. The result is an estimate, not a measurement.
//!
//! A [`MemUsageContext`] can be reused across runs: objects accounted by an
//! earlier successful run still count toward `total` but not toward
//! `incremental`.

use crate::config::MemUsageConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::gc::WeakRef;
use crate::host_value::HostValue;
use crate::object::{JsObject, ObjectKind, ObjectRef};
use crate::property::PropertyKey;
use crate::value::Value;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::time::Instant;
use tracing::debug;

/// Per-object overhead
pub const SIZE_EMPTY_STRUCT: u64 = 8;
/// Boolean
pub const SIZE_BOOL: u64 = 4;
/// Int32
pub const SIZE_INT: u64 = 8;
/// Double
pub const SIZE_NUMBER: u64 = 8;
/// Per-string overhead, on top of the UTF-8 length
pub const SIZE_STRING: u64 = 16;
/// Per-symbol overhead, on top of the description length
pub const SIZE_SYMBOL: u64 = 16;

/// Bytes attributed to a value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemUsage {
    /// Everything reachable in this run
    pub total: u64,
    /// The part not already accounted by an earlier run of the same context
    pub incremental: u64,
}

impl MemUsage {
    fn owned(bytes: u64, fresh: bool) -> Self {
        Self {
            total: bytes,
            incremental: if fresh { bytes } else { 0 },
        }
    }

    /// Scale a sample of `sampled` entries up to `count` entries
    fn extrapolate(self, sampled: usize, count: usize) -> Self {
        if sampled == 0 || count <= sampled {
            return self;
        }
        let scale = |bytes: u64| {
            let scaled = u128::from(bytes) * count as u128 / sampled as u128;
            u64::try_from(scaled).unwrap_or(u64::MAX)
        };
        Self {
            total: scale(self.total),
            incremental: scale(self.incremental),
        }
    }
}

impl Add for MemUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total.saturating_add(rhs.total),
            incremental: self.incremental.saturating_add(rhs.incremental),
        }
    }
}

impl AddAssign for MemUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Which budget stopped an estimation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLimit {
    /// Byte budget
    Size,
    /// Wall-clock budget
    Time,
    /// Nesting depth
    Depth,
}

impl fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Size => "size",
            Self::Time => "time",
            Self::Depth => "depth",
        })
    }
}

/// Budgets and bookkeeping for estimation runs
pub struct MemUsageContext {
    config: MemUsageConfig,
    accounted: FxHashMap<usize, WeakRef<JsObject>>,
    visited: FxHashMap<usize, WeakRef<JsObject>>,
    host_seen: FxHashSet<usize>,
    deadline: Option<Instant>,
    depth: usize,
    spent: MemUsage,
}

impl fmt::Debug for MemUsageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemUsageContext")
            .field("config", &self.config)
            .field("accounted", &self.accounted.len())
            .finish()
    }
}

impl Default for MemUsageContext {
    fn default() -> Self {
        Self::new(MemUsageConfig::default())
    }
}

impl MemUsageContext {
    /// Context with the given limits
    pub fn new(config: MemUsageConfig) -> Self {
        Self {
            config,
            accounted: FxHashMap::default(),
            visited: FxHashMap::default(),
            host_seen: FxHashSet::default(),
            deadline: None,
            depth: 0,
            spent: MemUsage::default(),
        }
    }

    /// The limits in effect
    pub fn config(&self) -> &MemUsageConfig {
        &self.config
    }

    /// Live objects accounted by earlier runs
    pub fn accounted_objects(&self) -> usize {
        self.accounted.values().filter(|weak| !weak.is_dead()).count()
    }

    /// Forget earlier runs; the next run's `incremental` equals its `total`
    pub fn reset(&mut self) {
        self.accounted.clear();
    }

    fn begin_run(&mut self, started: Instant) {
        self.visited.clear();
        self.host_seen.clear();
        self.depth = 0;
        self.spent = MemUsage::default();
        self.deadline = self.config.time_budget_duration().map(|budget| started + budget);
    }

    fn commit_run(&mut self) {
        self.accounted.retain(|_, weak| !weak.is_dead());
        self.accounted.extend(self.visited.drain());
    }

    fn is_accounted(&self, addr: usize) -> bool {
        self.accounted.get(&addr).is_some_and(|weak| !weak.is_dead())
    }

    fn exceeded(&self, limit: BudgetLimit) -> ObjectError {
        debug!(
            target: "otter::memory",
            %limit,
            spent = self.spent.total,
            depth = self.depth,
            "memory budget exceeded"
        );
        ObjectError::MemoryBudgetExceeded {
            limit,
            partial: self.spent,
        }
    }

    fn check_budgets(&self) -> ObjectResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(self.exceeded(BudgetLimit::Depth));
        }
        if let Some(max) = self.config.max_bytes
            && self.spent.total > max
        {
            return Err(self.exceeded(BudgetLimit::Size));
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(self.exceeded(BudgetLimit::Time));
        }
        Ok(())
    }

    fn charge(&mut self, bytes: u64, fresh: bool) -> MemUsage {
        let usage = MemUsage::owned(bytes, fresh);
        self.spent += usage;
        usage
    }

    /// Cost the first `threshold` items and scale to `count`
    fn sampled<I>(
        &mut self,
        count: usize,
        items: I,
        mut cost: impl FnMut(&mut Self, I::Item) -> ObjectResult<MemUsage>,
    ) -> ObjectResult<MemUsage>
    where
        I: IntoIterator,
    {
        let threshold = self.config.sample_threshold.max(1);
        let mut sum = MemUsage::default();
        let mut sampled = 0;
        for item in items.into_iter().take(threshold) {
            sum += cost(self, item)?;
            sampled += 1;
        }
        Ok(sum.extrapolate(sampled, count))
    }

    // ========================================================================
    // Walk
    // ========================================================================

    fn value_usage(&mut self, value: &Value, fresh: bool) -> ObjectResult<MemUsage> {
        match value {
            Value::Object(obj) => self.object_usage(obj),
            primitive => Ok(self.charge(primitive_size(primitive), fresh)),
        }
    }

    fn object_usage(&mut self, obj: &ObjectRef) -> ObjectResult<MemUsage> {
        let addr = obj.addr();
        if self.visited.contains_key(&addr) {
            return Ok(MemUsage::default());
        }
        self.check_budgets()?;
        self.visited.insert(addr, obj.downgrade());
        let fresh = !self.is_accounted(addr);

        self.depth += 1;
        let usage = self.object_body(obj, fresh);
        self.depth -= 1;
        usage
    }

    fn object_body(&mut self, obj: &ObjectRef, fresh: bool) -> ObjectResult<MemUsage> {
        let mut usage = self.charge(SIZE_EMPTY_STRUCT, fresh);
        if obj.raw_prototype().is_some() {
            usage += self.charge(SIZE_EMPTY_STRUCT, fresh);
        }

        let threshold = self.config.sample_threshold.max(1);
        let (count, sample) = obj.with_properties(|props| {
            let sample: Vec<_> = props
                .iter()
                .take(threshold)
                .map(|(key, desc)| (key, desc.clone()))
                .collect();
            (props.len(), sample)
        });
        usage += self.sampled(count, sample, |cx, (key, desc)| {
            let mut entry = cx.charge(key_size(&key), fresh);
            if let Some(value) = desc.value() {
                entry += cx.value_usage(value, fresh)?;
            }
            for func in [desc.getter(), desc.setter()].into_iter().flatten() {
                entry += cx.value_usage(func, fresh)?;
            }
            Ok(entry)
        })?;

        match obj.kind() {
            ObjectKind::Primitive(inner) => usage += self.value_usage(inner, fresh)?,
            ObjectKind::Proxy(proxy) => {
                usage += self.object_usage(proxy.target_raw())?;
                usage += self.object_usage(proxy.handler_raw())?;
            }
            ObjectKind::Map(data) => {
                let entries = std::iter::successors(data.next_entry(0), |(next, _, _)| data.next_entry(*next));
                usage += self.sampled(data.size(), entries, |cx, (_, key, value)| {
                    Ok(cx.value_usage(&key, fresh)? + cx.value_usage(&value, fresh)?)
                })?;
            }
            ObjectKind::HostMap(map) => {
                let entries = map.entries();
                usage += self.sampled(entries.len(), entries, |cx, (key, value)| {
                    let key_cost = cx.charge(key.len() as u64 + SIZE_STRING, fresh);
                    Ok(key_cost + cx.host_usage(&value, fresh)?)
                })?;
            }
            _ => {}
        }
        Ok(usage)
    }

    fn host_usage(&mut self, value: &HostValue, fresh: bool) -> ObjectResult<MemUsage> {
        let bytes = match value {
            HostValue::Undefined | HostValue::Null => 0,
            HostValue::Bool(_) => SIZE_BOOL,
            HostValue::Int(_) => SIZE_INT,
            HostValue::Float(_) => SIZE_NUMBER,
            HostValue::String(s) => s.len() as u64 + SIZE_STRING,
            HostValue::BigInt(n) => SIZE_EMPTY_STRUCT + n.bits().div_ceil(8),
            HostValue::Symbol(sym) => symbol_size(sym),
            HostValue::Function(func) => return self.object_usage(func.object()),
            HostValue::Array(items) => {
                if !self.host_seen.insert(items.addr()) {
                    return Ok(MemUsage::default());
                }
                self.check_budgets()?;
                let overhead = self.charge(SIZE_EMPTY_STRUCT, fresh);
                let items = items.to_vec();
                let elements = self.sampled(items.len(), items, |cx, item| cx.host_usage(&item, fresh))?;
                return Ok(overhead + elements);
            }
            HostValue::Map(map) => {
                if !self.host_seen.insert(map.addr()) {
                    return Ok(MemUsage::default());
                }
                self.check_budgets()?;
                let overhead = self.charge(SIZE_EMPTY_STRUCT, fresh);
                let entries = map.entries();
                let fields = self.sampled(entries.len(), entries, |cx, (key, item)| {
                    let key_cost = cx.charge(key.len() as u64 + SIZE_STRING, fresh);
                    Ok(key_cost + cx.host_usage(&item, fresh)?)
                })?;
                return Ok(overhead + fields);
            }
        };
        Ok(self.charge(bytes, fresh))
    }
}

fn symbol_size(sym: &crate::symbol::Symbol) -> u64 {
    SIZE_SYMBOL + sym.description().map_or(0, |d| d.len() as u64)
}

/// Fixed cost of a primitive; objects cost 0 here
pub fn primitive_size(value: &Value) -> u64 {
    match value {
        Value::Undefined | Value::Null | Value::Object(_) => 0,
        Value::Boolean(_) => SIZE_BOOL,
        Value::Int32(_) => SIZE_INT,
        Value::Number(_) => SIZE_NUMBER,
        Value::String(s) => s.len() as u64 + SIZE_STRING,
        Value::Symbol(sym) => symbol_size(sym),
        Value::BigInt(n) => SIZE_EMPTY_STRUCT + n.bits().div_ceil(8),
    }
}

/// Cost of a property key: its string form plus string overhead, or the
/// symbol cost
pub fn key_size(key: &PropertyKey) -> u64 {
    match key {
        PropertyKey::Index(index) => itoa::Buffer::new().format(*index).len() as u64 + SIZE_STRING,
        PropertyKey::String(s) => s.len() as u64 + SIZE_STRING,
        PropertyKey::Symbol(sym) => symbol_size(sym),
    }
}

/// Estimate the memory held by `value`.
///
/// Budgets from the context's config are checked before each object and
/// once more on the final total. Exceeding one returns
/// [`ObjectError::MemoryBudgetExceeded`] with the usage seen so far; a
/// failed run leaves the context's accounted set unchanged.
pub fn estimate(value: &Value, cx: &mut MemUsageContext) -> ObjectResult<MemUsage> {
    let started = Instant::now();
    cx.begin_run(started);

    let usage = cx.value_usage(value, true)?;
    if let Some(max) = cx.config.max_bytes
        && usage.total > max
    {
        cx.spent = usage;
        return Err(cx.exceeded(BudgetLimit::Size));
    }

    let objects = cx.visited.len();
    cx.commit_run();
    debug!(
        target: "otter::memory",
        total = usage.total,
        incremental = usage.incremental,
        objects,
        elapsed_us = started.elapsed().as_micros() as u64,
        "estimation complete"
    );
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;

    #[test]
    fn test_primitive_sizes() {
        assert_eq!(primitive_size(&Value::undefined()), 0);
        assert_eq!(primitive_size(&Value::boolean(true)), SIZE_BOOL);
        assert_eq!(primitive_size(&Value::int32(1)), SIZE_INT);
        assert_eq!(primitive_size(&Value::number(1.5)), SIZE_NUMBER);
        assert_eq!(primitive_size(&Value::from("abc")), 3 + SIZE_STRING);
    }

    #[test]
    fn test_key_sizes() {
        assert_eq!(key_size(&PropertyKey::Index(42)), 2 + SIZE_STRING);
        assert_eq!(key_size(&"test".into()), 4 + SIZE_STRING);
    }

    #[test]
    fn test_extrapolate() {
        let sample = MemUsage { total: 58, incremental: 58 };
        assert_eq!(sample.extrapolate(2, 4), MemUsage { total: 116, incremental: 116 });
        assert_eq!(sample.extrapolate(2, 2), sample);
        assert_eq!(sample.extrapolate(0, 4), sample);
    }

    #[test]
    fn test_cycles_count_once() {
        let realm = Realm::new();
        let obj = realm.create_object_with_proto(None);
        obj.set(&realm, &"me".into(), Value::Object(obj.clone())).unwrap();
        let usage = estimate(&Value::Object(obj), &mut MemUsageContext::default()).unwrap();
        assert_eq!(usage.total, SIZE_EMPTY_STRUCT + (2 + SIZE_STRING));
    }

    #[test]
    fn test_depth_budget() {
        let realm = Realm::new();
        let inner = realm.create_object_with_proto(None);
        let outer = realm.create_object_with_proto(None);
        outer.set(&realm, &"inner".into(), Value::Object(inner)).unwrap();

        let mut cx = MemUsageContext::new(MemUsageConfig::new().max_depth(1));
        let err = estimate(&Value::Object(outer), &mut cx).unwrap_err();
        match err {
            ObjectError::MemoryBudgetExceeded { limit, partial } => {
                assert_eq!(limit, BudgetLimit::Depth);
                assert_eq!(partial.total, SIZE_EMPTY_STRUCT + (5 + SIZE_STRING));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cx.accounted_objects(), 0);
    }
}
