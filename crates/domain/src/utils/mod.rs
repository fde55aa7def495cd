//! Small domain helpers

pub mod language;

pub use language::language_code;
