pub mod catalog;
pub mod field;
pub mod memory;
pub mod schema;
pub mod r#type;
