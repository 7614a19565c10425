pub mod backup;
pub mod core;
pub mod forms;
pub mod records;
pub mod reports;
pub mod schema;
pub mod setup;
