pub mod analyzer;
pub mod scorer;
