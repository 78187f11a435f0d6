pub mod serialization;
pub mod table;
pub mod view;
