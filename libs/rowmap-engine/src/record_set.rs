use std::any::type_name;

use indexmap::IndexMap;
use rowmap_api::{Dynamic, MapperError, Record};

/// Key of a record within a [`RecordSet`]: a position or an explicit name.
///
/// Converting from a string yields `Index` for canonical non-negative
/// integers (`"5"`, not `"05"` or `"+5"`), so `"5"` and `5` are one key and
/// flatten to one JSON key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Index(u64),
    Name(String),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Index(i) => write!(f, "{i}"),
            RecordKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for RecordKey {
    fn from(i: u64) -> Self {
        RecordKey::Index(i)
    }
}

impl From<&str> for RecordKey {
    fn from(name: &str) -> Self {
        match parse_index(name) {
            Some(i) => RecordKey::Index(i),
            None => RecordKey::Name(name.to_string()),
        }
    }
}

impl From<String> for RecordKey {
    fn from(name: String) -> Self {
        match parse_index(&name) {
            Some(i) => RecordKey::Index(i),
            None => RecordKey::Name(name),
        }
    }
}

/// `Some` only when `s` is exactly the decimal rendering of a `u64`.
fn parse_index(s: &str) -> Option<u64> {
    let canonical = match s.as_bytes() {
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    if canonical { s.parse().ok() } else { None }
}

/// Ordered collection of records, keyed like an ordered array: explicit keys
/// or positional append.
///
/// Appending (`key = None`) uses one past the highest index ever used in this
/// set; removing entries does not lower it. Once `u64::MAX` has been used
/// there is nowhere left to append and appends fail.
#[derive(Debug)]
pub struct RecordSet<R: Record> {
    records: IndexMap<RecordKey, R>,
    /// `None` once the index space is exhausted.
    next_index: Option<u64>,
}

impl<R: Record> Default for RecordSet<R> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
            next_index: Some(0),
        }
    }
}

impl<R: Record> RecordSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<K: Into<RecordKey>>(records: impl IntoIterator<Item = (K, R)>) -> Self {
        let mut set = Self::new();
        for (key, record) in records {
            set.insert(key.into(), record);
        }
        set
    }

    /// Insert or overwrite at `key`, or append when `key` is `None`.
    ///
    /// An existing key keeps its position. Returns the key used. Only an
    /// append can fail, with [`MapperError::IndexExhausted`], and the set is
    /// left untouched when it does.
    pub fn set(&mut self, key: Option<RecordKey>, record: R) -> Result<RecordKey, MapperError> {
        let key = match key {
            Some(key) => key,
            None => RecordKey::Index(self.next_index.ok_or(MapperError::IndexExhausted)?),
        };
        Ok(self.insert(key, record))
    }

    /// Append at the next position.
    pub fn push(&mut self, record: R) -> Result<RecordKey, MapperError> {
        self.set(None, record)
    }

    /// Insert or overwrite at an explicit key. Never fails.
    pub fn insert(&mut self, key: RecordKey, record: R) -> RecordKey {
        if let RecordKey::Index(i) = key {
            self.next_index = match (self.next_index, i.checked_add(1)) {
                (Some(next), Some(after)) => Some(next.max(after)),
                _ => None,
            };
        }
        self.records.insert(key.clone(), record);
        key
    }

    pub fn get(&self, key: &RecordKey) -> Option<&R> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut R> {
        self.records.get_mut(key)
    }

    pub fn has(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    /// Remove the record at `key`. Absent keys are a no-op.
    pub fn remove(&mut self, key: &RecordKey) -> Option<R> {
        self.records.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &R)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.records.keys()
    }

    /// Flatten every record, keyed as in the set and in iteration order.
    pub fn to_plain(&self) -> serde_json::Map<String, serde_json::Value> {
        self.records
            .iter()
            .map(|(key, record)| (key.to_string(), record.to_plain()))
            .collect()
    }
}

impl<R: Record + 'static> RecordSet<R> {
    /// Runtime-checked insertion for values that arrive untyped.
    ///
    /// Fails with [`MapperError::InvalidType`] naming the received type when
    /// `value` is not an `R`; the set is not modified in that case.
    pub fn try_set(&mut self, key: Option<RecordKey>, value: Box<dyn Dynamic>) -> Result<RecordKey, MapperError> {
        let actual = Dynamic::type_name(&*value);
        let record = Dynamic::into_any(value)
            .downcast::<R>()
            .map_err(|_| MapperError::InvalidType { expected: type_name::<R>(), actual })?;
        self.set(key, *record)
    }

    /// Build a set from untyped values, checking each one.
    pub fn try_from_dynamic<K: Into<RecordKey>>(
        values: impl IntoIterator<Item = (K, Box<dyn Dynamic>)>,
    ) -> Result<Self, MapperError> {
        let mut set = Self::new();
        for (key, value) in values {
            set.try_set(Some(key.into()), value)?;
        }
        Ok(set)
    }
}

/// Missing keys are out of contract and panic; check with [`RecordSet::has`].
impl<R: Record> std::ops::Index<&RecordKey> for RecordSet<R> {
    type Output = R;

    fn index(&self, key: &RecordKey) -> &R {
        &self.records[key]
    }
}

impl<'a, R: Record> IntoIterator for &'a RecordSet<R> {
    type Item = (&'a RecordKey, &'a R);
    type IntoIter = indexmap::map::Iter<'a, RecordKey, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Records are keyed `0, 1, 2, ...` in iteration order.
impl<R: Record> FromIterator<R> for RecordSet<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = Self::new();
        for (i, record) in (0_u64..).zip(iter) {
            set.insert(RecordKey::Index(i), record);
        }
        set
    }
}
