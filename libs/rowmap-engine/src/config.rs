use std::collections::HashSet;

use serde::Deserialize;

use rowmap_api::{MapperError, TableSchema};

/// Root configuration, parsed from TOML.
///
/// ```toml
/// [[tables]]
/// name = "authors"
/// primary_key = ["id"]
/// columns = ["id", "name"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapperConfig {
    /// Table metadata, one entry per mapped table.
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl MapperConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, MapperError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| MapperError::Io { path: path.to_string(), source })?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MapperError> {
        let config: MapperConfig =
            toml::from_str(toml_str).map_err(|e| MapperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapperError> {
        let mut names = HashSet::new();
        for table in &self.tables {
            table.validate()?;
            if !names.insert(table.name.as_str()) {
                return Err(MapperError::Config(format!("duplicate table '{}'", table.name)));
            }
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tables() {
        let config = MapperConfig::parse(
            r#"
            [[tables]]
            name = "authors"
            primary_key = ["id"]
            columns = ["id", "name"]

            [[tables]]
            name = "taggings"
            primary_key = ["post_id", "tag_id"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tables.len(), 2);
        let taggings = config.table("taggings").unwrap();
        assert_eq!(taggings.primary_key, vec!["post_id", "tag_id"]);
        assert!(taggings.columns.is_empty());
        assert!(config.table("missing").is_none());
    }

    #[test]
    fn empty_config() {
        assert!(MapperConfig::parse("").unwrap().tables.is_empty());
    }

    #[test]
    fn duplicate_tables_rejected() {
        let err = MapperConfig::parse(
            r#"
            [[tables]]
            name = "authors"
            primary_key = ["id"]

            [[tables]]
            name = "authors"
            primary_key = ["id"]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "config error: duplicate table 'authors'");
    }

    #[test]
    fn malformed_toml() {
        let err = MapperConfig::parse("[[tables]]\nname = 3").unwrap_err();
        assert!(matches!(err, MapperError::Config(_)));
    }

    #[test]
    fn missing_file() {
        let err = MapperConfig::load("/nonexistent/rowmap.toml").unwrap_err();
        assert_eq!(err.kind(), rowmap_api::ErrorKind::Io);
        match &err {
            MapperError::Io { path, source } => {
                assert_eq!(path, "/nonexistent/rowmap.toml");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("io error: /nonexistent/rowmap.toml: "));
    }
}
