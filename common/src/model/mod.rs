pub mod document;
pub mod payload;
pub mod revision;
pub mod sheet;
