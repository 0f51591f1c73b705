use rowmap_api::{Columns, MapperError, PrimaryKey, RowRef, TableSchema};

use crate::identity::IdentityMap;

/// One table's identity tracking within a unit of work.
///
/// Binds the table's declared primary key to its own [`IdentityMap`], so
/// callers hand over raw fetched columns and get back the canonical row.
#[derive(Debug)]
pub struct Table {
    schema: TableSchema,
    identity: IdentityMap,
}

impl Table {
    pub fn new(schema: TableSchema) -> Result<Self, MapperError> {
        schema.validate()?;
        Ok(Self {
            schema,
            identity: IdentityMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn identity(&self) -> &IdentityMap {
        &self.identity
    }

    pub fn primary_key_of(&self, row: &RowRef) -> PrimaryKey {
        PrimaryKey::from_row(&row.read(), &self.schema.primary_key)
    }

    /// Canonical row for freshly fetched columns.
    ///
    /// If a row with the same primary key is already tracked it is returned
    /// as-is and `columns` is discarded, so in-memory changes are never
    /// clobbered by a re-fetch. Otherwise a new row is registered with
    /// `columns` as its baseline.
    pub fn hydrate(&mut self, columns: Columns) -> Result<RowRef, MapperError> {
        let key = PrimaryKey::from_columns(&columns, &self.schema.primary_key);
        if let Some(existing) = self.identity.lookup(&key) {
            return Ok(existing);
        }

        let row = RowRef::from_columns(columns.clone());
        self.identity.register(&row, columns, &self.schema.primary_key)?;
        tracing::debug!(table = %self.schema.name, "hydrated new row");
        Ok(row)
    }

    /// Start tracking a row that was just inserted; its current columns become
    /// the baseline.
    pub fn adopt(&mut self, row: &RowRef) -> Result<(), MapperError> {
        let initial = row.to_columns();
        self.identity.register(row, initial, &self.schema.primary_key)?;
        Ok(())
    }

    /// Already tracked (update) or not (insert)?
    pub fn is_tracked(&self, row: &RowRef) -> bool {
        self.identity.contains(row)
    }

    pub fn find(&self, key: &PrimaryKey) -> Option<RowRef> {
        self.identity.lookup(key)
    }

    /// Columns to put in an UPDATE for `row`.
    pub fn changes(&self, row: &RowRef) -> Result<Columns, MapperError> {
        self.identity.diff(row)
    }

    /// Reset the baseline after the row's state has been written back.
    pub fn mark_persisted(&mut self, row: &RowRef) -> Result<(), MapperError> {
        self.identity.refresh_snapshot(row)
    }

    /// Baseline snapshot, as captured at registration or the last write-back.
    pub fn initial(&self, row: &RowRef) -> Result<&Columns, MapperError> {
        self.identity.snapshot(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_api::Value;

    fn fetched(id: i64, name: &str) -> Columns {
        Columns::from_iter([
            ("id".to_string(), Value::from(id)),
            ("name".to_string(), Value::from(name)),
        ])
    }

    fn authors() -> Table {
        Table::new(TableSchema::new("authors", ["id"]).with_columns(["id", "name"])).unwrap()
    }

    #[test]
    fn hydrate_preserves_identity() {
        let mut table = authors();
        let first = table.hydrate(fetched(1, "x")).unwrap();
        first.set("name", "edited");

        let again = table.hydrate(fetched(1, "x")).unwrap();
        assert!(again.ptr_eq(&first));
        assert_eq!(again.value("name"), Value::from("edited"));

        let other = table.hydrate(fetched(2, "z")).unwrap();
        assert!(!other.ptr_eq(&first));
        assert_eq!(table.identity().len(), 2);
    }

    #[test]
    fn insert_then_update_cycle() {
        let mut table = authors();
        let row = RowRef::from_columns(fetched(3, "new"));
        assert!(!table.is_tracked(&row));

        table.adopt(&row).unwrap();
        assert!(table.is_tracked(&row));
        assert!(table.changes(&row).unwrap().is_empty());

        row.set("name", "renamed");
        let changes = table.changes(&row).unwrap();
        assert_eq!(changes.get("name"), Some(&Value::from("renamed")));
        assert_eq!(changes.len(), 1);

        table.mark_persisted(&row).unwrap();
        assert!(table.changes(&row).unwrap().is_empty());
        assert_eq!(table.initial(&row).unwrap().get("name"), Some(&Value::from("renamed")));
    }

    #[test]
    fn find_by_primary_key() {
        let mut table = authors();
        let row = table.hydrate(fetched(9, "x")).unwrap();
        let key = table.primary_key_of(&row);
        assert!(table.find(&key).unwrap().ptr_eq(&row));
    }

    #[test]
    fn invalid_schema_is_rejected() {
        let err = Table::new(TableSchema::new("authors", Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, MapperError::Config(_)));
    }
}
