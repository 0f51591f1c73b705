use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::value::Value;

/// Column name → value, in the order the columns were fetched or declared.
pub type Columns = IndexMap<String, Value>;

/// Identifier of one identity map instance.
///
/// Unique within the process, so a handle issued by one unit of work is
/// never mistaken for a handle of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(u64);

impl MapId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MapId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque registration handle, stamped onto a row when an identity map
/// takes it in. A row carries at most one handle per map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle {
    pub map: MapId,
    pub index: usize,
}

/// A mutable set of named column values.
#[derive(Debug, Default)]
pub struct Row {
    columns: Columns,
    handles: Vec<RowHandle>,
}

/// A clone is a new, unregistered row: the handles stay with the original.
impl Clone for Row {
    fn clone(&self) -> Self {
        Row::new(self.columns.clone())
    }
}

impl Row {
    pub fn new(columns: Columns) -> Self {
        Self { columns, handles: Vec::new() }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Current value of `column`. Columns the row does not carry read as `Null`.
    pub fn value(&self, column: &str) -> Value {
        self.columns.get(column).cloned().unwrap_or(Value::Null)
    }

    /// Overwrite an existing column in place or append a new one.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Full copy of the column values.
    pub fn to_columns(&self) -> Columns {
        self.columns.clone()
    }

    /// Handle issued by the identity map `map`, if it registered this row.
    pub fn handle_in(&self, map: MapId) -> Option<RowHandle> {
        self.handles.iter().copied().find(|h| h.map == map)
    }

    pub fn handles(&self) -> &[RowHandle] {
        &self.handles
    }

    /// Only identity maps stamp handles; everything else treats them as
    /// read-only. Replaces any handle previously stamped by the same map.
    pub fn set_handle(&mut self, handle: RowHandle) {
        match self.handles.iter_mut().find(|h| h.map == handle.map) {
            Some(slot) => *slot = handle,
            None => self.handles.push(handle),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Shared reference to one row instance.
///
/// Cloning the `RowRef` shares the row; identity is the allocation, not the
/// column values. Two rows with equal columns are still two rows.
#[derive(Debug, Clone)]
pub struct RowRef(Arc<RwLock<Row>>);

impl RowRef {
    pub fn new(row: Row) -> Self {
        RowRef(Arc::new(RwLock::new(row)))
    }

    pub fn from_columns(columns: Columns) -> Self {
        Self::new(Row::new(columns))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Row> {
        match self.0.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("row read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Row> {
        match self.0.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("row write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Same row instance?
    pub fn ptr_eq(&self, other: &RowRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn value(&self, column: &str) -> Value {
        self.read().value(column)
    }

    pub fn set(&self, column: impl Into<String>, value: impl Into<Value>) {
        self.write().set(column, value);
    }

    pub fn to_columns(&self) -> Columns {
        self.read().to_columns()
    }

    pub fn handle_in(&self, map: MapId) -> Option<RowHandle> {
        self.read().handle_in(map)
    }
}

/// Primary-key column → value, ordered by the table's declared key columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKey(IndexMap<String, Value>);

impl PrimaryKey {
    /// Read `columns` from `row`, in the given order.
    pub fn from_row<S: AsRef<str>>(row: &Row, columns: &[S]) -> Self {
        PrimaryKey(
            columns
                .iter()
                .map(|c| (c.as_ref().to_string(), row.value(c.as_ref())))
                .collect(),
        )
    }

    /// Same as [`PrimaryKey::from_row`], over raw fetched columns.
    pub fn from_columns<S: AsRef<str>>(data: &Columns, columns: &[S]) -> Self {
        PrimaryKey(
            columns
                .iter()
                .map(|c| {
                    let value = data.get(c.as_ref()).cloned().unwrap_or(Value::Null);
                    (c.as_ref().to_string(), value)
                })
                .collect(),
        )
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PrimaryKey {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PrimaryKey(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
