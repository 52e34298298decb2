pub mod cache;
pub mod converters;
pub mod errors;
