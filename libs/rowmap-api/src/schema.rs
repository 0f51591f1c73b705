use std::collections::HashSet;

use crate::error::MapperError;

/// Table metadata the identity layer needs: the name, the declared primary
/// key columns (their order fixes serial order) and, optionally, the full
/// column list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub primary_key: Vec<String>,
    /// Empty means "not declared"; primary-key columns are then not checked.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn new<S: Into<String>>(name: impl Into<String>, primary_key: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into_iter().map(Into::into).collect(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), MapperError> {
        if self.name.is_empty() {
            return Err(MapperError::Config("table name is empty".into()));
        }
        let ctx = format!("table '{}'", self.name);

        if self.primary_key.is_empty() {
            return Err(MapperError::Config("primary key is empty".into()).with_context(&ctx));
        }

        let mut seen = HashSet::new();
        for col in &self.primary_key {
            if !seen.insert(col.as_str()) {
                return Err(MapperError::Config(format!("duplicate primary key column '{col}'"))
                    .with_context(&ctx));
            }
            if !self.columns.is_empty() && !self.columns.contains(col) {
                return Err(MapperError::Config(format!(
                    "primary key column '{col}' is not a declared column"
                ))
                .with_context(&ctx));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_schema() {
        let schema = TableSchema::new("authors", ["id"]).with_columns(["id", "name"]);
        assert!(schema.validate().is_ok());
        assert!(TableSchema::new("tags", ["a", "b"]).validate().is_ok());
    }

    #[test]
    fn invalid_schemas() {
        let empty_pk = TableSchema::new("authors", Vec::<String>::new());
        assert!(matches!(empty_pk.validate(), Err(MapperError::Config(_))));

        let dup = TableSchema::new("authors", ["id", "id"]);
        let err = dup.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate primary key column 'id'"));

        let undeclared = TableSchema::new("authors", ["id"]).with_columns(["name"]);
        assert!(undeclared.validate().is_err());

        assert!(TableSchema::new("", ["id"]).validate().is_err());
    }
}
