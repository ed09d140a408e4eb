pub mod tables;

pub use tables::TableSchema;
