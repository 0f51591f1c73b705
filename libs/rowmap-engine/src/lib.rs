pub mod config;
pub mod identity;
pub mod record_set;
pub mod serial;
pub mod table;
pub mod unit_of_work;

pub use config::MapperConfig;
pub use identity::IdentityMap;
pub use record_set::{RecordKey, RecordSet};
pub use serial::{SEPARATOR, Serial};
pub use table::Table;
pub use unit_of_work::UnitOfWork;
