use std::any::Any;

use indexmap::IndexMap;

use crate::row::RowRef;

/// Higher-level entity: one row plus whatever related data the mapper loaded
/// alongside it.
///
/// Everything a record collection holds must implement this.
pub trait Record: Send + Sync {
    /// The row this record wraps.
    fn row(&self) -> &RowRef;

    /// Recursively flatten the record, its row and all related data into a
    /// plain nested value.
    ///
    /// Default: the row's columns as a JSON object.
    fn to_plain(&self) -> serde_json::Value {
        row_to_plain(self.row())
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn row(&self) -> &RowRef {
        (**self).row()
    }

    fn to_plain(&self) -> serde_json::Value {
        (**self).to_plain()
    }
}

/// Columns of `row` as a JSON object, in column order.
pub fn row_to_plain(row: &RowRef) -> serde_json::Value {
    let guard = row.read();
    let map: serde_json::Map<String, serde_json::Value> = guard
        .columns()
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    serde_json::Value::Object(map)
}

/// Related data hanging off a record.
pub enum Related {
    /// Relationship was not loaded or matched nothing.
    None,
    Row(RowRef),
    Record(Box<dyn Record>),
    Set(Vec<Box<dyn Record>>),
}

impl Related {
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Related::None => serde_json::Value::Null,
            Related::Row(row) => row_to_plain(row),
            Related::Record(record) => record.to_plain(),
            Related::Set(records) => {
                serde_json::Value::Array(records.iter().map(|r| r.to_plain()).collect())
            }
        }
    }
}

impl std::fmt::Debug for Related {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Related::None => f.write_str("None"),
            Related::Row(row) => f.debug_tuple("Row").field(row).finish(),
            Related::Record(_) => f.write_str("Record(..)"),
            Related::Set(records) => write!(f, "Set(len={})", records.len()),
        }
    }
}

/// General-purpose record: a row and named related values.
///
/// Flattens to the row's columns with each related value stored under its
/// name. A related name equal to a column name shadows the column.
#[derive(Debug)]
pub struct Entity {
    row: RowRef,
    related: IndexMap<String, Related>,
}

impl Entity {
    pub fn new(row: RowRef) -> Self {
        Self { row, related: IndexMap::new() }
    }

    pub fn with_related(mut self, name: impl Into<String>, related: Related) -> Self {
        self.related.insert(name.into(), related);
        self
    }

    pub fn set_related(&mut self, name: impl Into<String>, related: Related) {
        self.related.insert(name.into(), related);
    }

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }
}

impl Record for Entity {
    fn row(&self) -> &RowRef {
        &self.row
    }

    fn to_plain(&self) -> serde_json::Value {
        let mut plain = row_to_plain(&self.row);
        if let serde_json::Value::Object(map) = &mut plain {
            for (name, related) in &self.related {
                map.insert(name.clone(), related.to_plain());
            }
        }
        plain
    }
}

/// An untyped value that still knows its concrete type's name.
///
/// Used where insertion cannot be checked at compile time (values assembled
/// from untyped input); the receiving container downcasts and reports the
/// name on mismatch.
pub trait Dynamic: Any + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Send + Sync> Dynamic for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
