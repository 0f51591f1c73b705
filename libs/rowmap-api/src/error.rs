/// Category of a mapper error. Lets the enclosing unit of work decide
/// whether to abort or translate the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller sequencing bug (double registration, unregistered row,
    /// append past the last index). Permanent, never retried.
    Usage,
    /// A value of the wrong type was handed to a typed container.
    Type,
    /// Invalid table metadata or configuration. Fail at startup.
    Config,
    /// I/O error while loading configuration.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Usage => f.write_str("usage"),
            ErrorKind::Type => f.write_str("type"),
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("row already mapped (serial {serial:?})")]
    AlreadyMapped { serial: String },

    #[error("row not mapped")]
    NotMapped,

    #[error("no index left to append at")]
    IndexExhausted,

    #[error("expected {expected}, got {actual}")]
    InvalidType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MapperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapperError::AlreadyMapped { .. }
            | MapperError::NotMapped
            | MapperError::IndexExhausted => ErrorKind::Usage,
            MapperError::InvalidType { .. } => ErrorKind::Type,
            MapperError::Config(_) | MapperError::UnknownTable(_) => ErrorKind::Config,
            MapperError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Add context to the error.
    ///
    /// Context is prepended to the message of message-bearing variants;
    /// the structured variants are returned unchanged.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            MapperError::Config(msg) => MapperError::Config(format!("{ctx}: {msg}")),
            MapperError::UnknownTable(msg) => MapperError::UnknownTable(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(MapperError::NotMapped.kind(), ErrorKind::Usage);
        assert_eq!(
            MapperError::AlreadyMapped { serial: "|\u{1f}1|\u{1f}".into() }.kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            MapperError::InvalidType { expected: "A", actual: "B" }.kind(),
            ErrorKind::Type
        );
        assert_eq!(MapperError::IndexExhausted.kind(), ErrorKind::Usage);
        let io = MapperError::Io {
            path: "rowmap.toml".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().starts_with("io error: rowmap.toml: "));
        assert!(std::error::Error::source(&io).is_some());
    }

    #[test]
    fn context_is_prepended() {
        let err = MapperError::Config("empty primary key".into()).with_context("table 'authors'");
        assert_eq!(err.to_string(), "config error: table 'authors': empty primary key");
        let err = MapperError::NotMapped.with_context("ignored");
        assert_eq!(err.to_string(), "row not mapped");
    }
}
