use std::collections::HashMap;

use rowmap_api::{Columns, MapId, MapperError, PrimaryKey, RowHandle, RowRef, Value};

use crate::serial::Serial;

/// One registered row: the row itself, the serial it was indexed under and
/// the baseline snapshot used for diffing.
#[derive(Debug)]
struct Entry {
    row: RowRef,
    serial: Serial,
    initial: Columns,
}

/// Identity map for one unit of work.
///
/// Guarantees a single in-memory row per primary key value: the mapper asks
/// [`IdentityMap::lookup`] before building a row, and registers the rows it
/// does build. Each registered row is stamped with a [`RowHandle`] that
/// indexes `entries`; the serial index points back into the same arena.
///
/// Rows are indexed, never owned exclusively or destroyed. Entries live
/// until the map is dropped with its unit of work.
#[derive(Debug)]
pub struct IdentityMap {
    id: MapId,
    entries: Vec<Entry>,
    by_serial: HashMap<Serial, usize>,
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self {
            id: MapId::next(),
            entries: Vec::new(),
            by_serial: HashMap::new(),
        }
    }
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    /// Register `row` under the key formed by `primary_key` columns, with
    /// `initial` as its diff baseline.
    ///
    /// Fails with [`MapperError::AlreadyMapped`] if this row instance is
    /// already registered in this map; the map is left untouched then.
    /// Registration in other maps, live or dropped, does not count: the row
    /// gets a handle for this map next to the ones it already carries.
    pub fn register<S: AsRef<str>>(
        &mut self,
        row: &RowRef,
        initial: Columns,
        primary_key: &[S],
    ) -> Result<RowHandle, MapperError> {
        let mut guard = row.write();
        let serial = Serial::from_row(&guard, primary_key);

        if self.owns(row, guard.handle_in(self.id)).is_some() {
            return Err(MapperError::AlreadyMapped { serial: serial.into_string() });
        }

        let handle = RowHandle { map: self.id, index: self.entries.len() };
        if let Some(previous) = self.by_serial.insert(serial.clone(), handle.index) {
            tracing::warn!(
                serial = ?serial.as_str(),
                previous,
                index = handle.index,
                "serial already registered to another row, re-pointing to the new row"
            );
        }
        guard.set_handle(handle);
        drop(guard);

        tracing::debug!(serial = ?serial.as_str(), index = handle.index, "registered row");
        self.entries.push(Entry { row: row.clone(), serial, initial });
        Ok(handle)
    }

    /// Is this exact row instance registered here?
    pub fn contains(&self, row: &RowRef) -> bool {
        self.index_of(row).is_some()
    }

    /// Row registered under `key`, if any. `None` is a normal outcome.
    pub fn lookup(&self, key: &PrimaryKey) -> Option<RowRef> {
        self.lookup_serial(&Serial::from_key(key))
    }

    /// Same as [`IdentityMap::lookup`], with bare values in key column order.
    pub fn lookup_values(&self, values: &[Value]) -> Option<RowRef> {
        self.lookup_serial(&Serial::from_values(values))
    }

    fn lookup_serial(&self, serial: &Serial) -> Option<RowRef> {
        match self.by_serial.get(serial) {
            Some(&index) => {
                tracing::debug!(serial = ?serial.as_str(), index, "identity map hit");
                Some(self.entries[index].row.clone())
            }
            None => {
                tracing::debug!(serial = ?serial.as_str(), "identity map miss");
                None
            }
        }
    }

    /// Make the row's current columns its new diff baseline, e.g. after the
    /// row was written back.
    pub fn refresh_snapshot(&mut self, row: &RowRef) -> Result<(), MapperError> {
        let index = self.index_of(row).ok_or(MapperError::NotMapped)?;
        let entry = &mut self.entries[index];
        entry.initial = row.to_columns();
        tracing::debug!(serial = ?entry.serial.as_str(), index, "refreshed snapshot");
        Ok(())
    }

    /// Baseline captured at registration or at the last refresh.
    ///
    /// A separate copy: later mutations of the row never show up here.
    pub fn snapshot(&self, row: &RowRef) -> Result<&Columns, MapperError> {
        self.entry(row).map(|e| &e.initial)
    }

    /// Columns whose current value differs from the baseline, plus columns
    /// added since. Empty when the row is clean.
    pub fn diff(&self, row: &RowRef) -> Result<Columns, MapperError> {
        let entry = self.entry(row)?;
        let guard = row.read();
        Ok(guard
            .columns()
            .iter()
            .filter(|(name, value)| entry.initial.get(name.as_str()) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    pub fn is_dirty(&self, row: &RowRef) -> Result<bool, MapperError> {
        Ok(!self.diff(row)?.is_empty())
    }

    /// Serial the row was registered under.
    pub fn serial_of(&self, row: &RowRef) -> Option<&Serial> {
        self.entry(row).ok().map(|e| &e.serial)
    }

    /// Row behind a handle issued by this map.
    pub fn get(&self, handle: RowHandle) -> Option<&RowRef> {
        if handle.map != self.id {
            return None;
        }
        self.entries.get(handle.index).map(|e| &e.row)
    }

    /// Registered rows, in registration order.
    pub fn rows(&self) -> impl Iterator<Item = &RowRef> {
        self.entries.iter().map(|e| &e.row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, row: &RowRef) -> Result<&Entry, MapperError> {
        self.index_of(row)
            .map(|index| &self.entries[index])
            .ok_or(MapperError::NotMapped)
    }

    fn index_of(&self, row: &RowRef) -> Option<usize> {
        let handle = row.handle_in(self.id);
        self.owns(row, handle)
    }

    /// Entry index behind `handle`, as read from `row` by the caller. Lets
    /// `register` check membership while it holds the row's write lock.
    fn owns(&self, row: &RowRef, handle: Option<RowHandle>) -> Option<usize> {
        let handle = handle.filter(|h| h.map == self.id)?;
        self.entries
            .get(handle.index)
            .filter(|e| e.row.ptr_eq(row))
            .map(|_| handle.index)
    }
}
