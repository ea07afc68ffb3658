pub mod builder;
pub mod rolling;
