// Transport-free modules: values, wire classification, records, errors.
pub mod error;
pub mod records;
pub mod typed;
pub mod value;
