pub mod error;
pub mod record;
pub mod row;
pub mod schema;
pub mod value;

pub use error::{ErrorKind, MapperError};
pub use record::{Dynamic, Entity, Record, Related};
pub use row::{Columns, MapId, PrimaryKey, Row, RowHandle, RowRef};
pub use schema::TableSchema;
pub use value::Value;
