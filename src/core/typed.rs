//! Purpose: Classify application values into the eight wire-level variants and back.
//! Exports: `TypedValue`, `Shaped`, `WireType`, `classify`.
//! Role: Pure mapping between `Value` and what the transport primitives carry.
//! Invariants: Arrays are classified by their first element only.
//! Invariants: Zero-sized arrays are rejected before classification.
//! Invariants: `TypedValue::into_value` inverts the flatten step exactly.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Complex, NdArray, Value};
use std::fmt;

/// Flat row-major data plus its shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Shaped<T> {
    pub data: Vec<T>,
    pub shape: Vec<usize>,
}

impl<T> Shaped<T> {
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    IntegerScalar(i64),
    RealScalar(f64),
    ComplexScalar(Complex),
    StringScalar(String),
    IntegerArray(Shaped<i64>),
    RealArray(Shaped<f64>),
    ComplexArray(Shaped<Complex>),
    StringArray(Shaped<String>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WireType {
    Integer,
    Real,
    Complex,
    String,
    IntegerArray,
    RealArray,
    ComplexArray,
    StringArray,
}

impl WireType {
    pub fn as_str(self) -> &'static str {
        match self {
            WireType::Integer => "integer",
            WireType::Real => "real",
            WireType::Complex => "complex",
            WireType::String => "string",
            WireType::IntegerArray => "integer_array",
            WireType::RealArray => "real_array",
            WireType::ComplexArray => "complex_array",
            WireType::StringArray => "string_array",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TypedValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            TypedValue::IntegerScalar(_) => WireType::Integer,
            TypedValue::RealScalar(_) => WireType::Real,
            TypedValue::ComplexScalar(_) => WireType::Complex,
            TypedValue::StringScalar(_) => WireType::String,
            TypedValue::IntegerArray(_) => WireType::IntegerArray,
            TypedValue::RealArray(_) => WireType::RealArray,
            TypedValue::ComplexArray(_) => WireType::ComplexArray,
            TypedValue::StringArray(_) => WireType::StringArray,
        }
    }

    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            TypedValue::IntegerArray(array) => Some(&array.shape),
            TypedValue::RealArray(array) => Some(&array.shape),
            TypedValue::ComplexArray(array) => Some(&array.shape),
            TypedValue::StringArray(array) => Some(&array.shape),
            _ => None,
        }
    }

    /// Payload size in bytes, excluding shape and metadata.
    pub fn datasize(&self) -> u64 {
        let bytes = match self {
            TypedValue::IntegerScalar(_) | TypedValue::RealScalar(_) => 8,
            TypedValue::ComplexScalar(_) => 16,
            TypedValue::StringScalar(text) => text.len(),
            TypedValue::IntegerArray(array) => 8 * array.data.len(),
            TypedValue::RealArray(array) => 8 * array.data.len(),
            TypedValue::ComplexArray(array) => 16 * array.data.len(),
            TypedValue::StringArray(array) => array.data.iter().map(String::len).sum(),
        };
        bytes as u64
    }

    /// Rebuilds the application value; arrays are reshaped row-major.
    pub fn into_value(self) -> Result<Value, Error> {
        match self {
            TypedValue::IntegerScalar(int) => Ok(Value::Integer(int)),
            TypedValue::RealScalar(real) => Ok(Value::Real(real)),
            TypedValue::ComplexScalar(complex) => Ok(Value::Complex(complex)),
            TypedValue::StringScalar(text) => Ok(Value::String(text)),
            TypedValue::IntegerArray(array) => reshape(array, Value::Integer),
            TypedValue::RealArray(array) => reshape(array, Value::Real),
            TypedValue::ComplexArray(array) => reshape(array, Value::Complex),
            TypedValue::StringArray(array) => reshape(array, Value::String),
        }
    }
}

fn reshape<T>(array: Shaped<T>, wrap: fn(T) -> Value) -> Result<Value, Error> {
    let data = array.data.into_iter().map(wrap).collect();
    NdArray::new(array.shape, data).map(Value::Array).map_err(|err| {
        let message = err.message().unwrap_or("invalid array shape").to_string();
        Error::new(ErrorKind::Internal)
            .with_message(format!("store returned a malformed array: {message}"))
    })
}

/// Maps a value onto its wire variant.
///
/// Lists are first normalized into an array; the array is then classified.
pub fn classify(value: Value) -> Result<TypedValue, Error> {
    match normalize(value)? {
        Value::Bool(flag) => Ok(TypedValue::IntegerScalar(i64::from(flag))),
        Value::Integer(int) => Ok(TypedValue::IntegerScalar(int)),
        Value::Real(real) => Ok(TypedValue::RealScalar(real)),
        Value::Complex(complex) => Ok(TypedValue::ComplexScalar(complex)),
        Value::String(text) => Ok(TypedValue::StringScalar(text)),
        Value::Array(array) => classify_array(array),
        other => Err(unsupported(format!(
            "values of type {} cannot be posted",
            other.type_name()
        ))),
    }
}

fn normalize(value: Value) -> Result<Value, Error> {
    match value {
        Value::List(items) => NdArray::from_list(items).map(Value::Array),
        other => Ok(other),
    }
}

fn classify_array(array: NdArray) -> Result<TypedValue, Error> {
    if array.is_empty() {
        return Err(Error::new(ErrorKind::EmptyArray).with_message("array size cannot be zero"));
    }
    let (shape, data) = array.into_parts();
    match data[0].type_name() {
        "integer" => convert(data, as_integer)
            .map(|data| TypedValue::IntegerArray(Shaped::new(data, shape))),
        "real" => {
            convert(data, as_real).map(|data| TypedValue::RealArray(Shaped::new(data, shape)))
        }
        "complex" => convert(data, as_complex)
            .map(|data| TypedValue::ComplexArray(Shaped::new(data, shape))),
        "string" => convert(data, as_string)
            .map(|data| TypedValue::StringArray(Shaped::new(data, shape))),
        first => Err(unsupported(format!(
            "arrays of {first} elements cannot be posted"
        ))),
    }
}

fn convert<T>(data: Vec<Value>, element: fn(Value) -> Option<T>) -> Result<Vec<T>, Error> {
    data.into_iter()
        .enumerate()
        .map(|(index, value)| {
            let name = value.type_name();
            element(value).ok_or_else(|| {
                unsupported(format!(
                    "array element {index} of type {name} does not fit the array type"
                ))
            })
        })
        .collect()
}

fn as_integer(value: Value) -> Option<i64> {
    match value {
        Value::Integer(int) => Some(int),
        Value::Real(real) if real.fract() == 0.0 && real.abs() < i64::MAX as f64 => {
            Some(real as i64)
        }
        _ => None,
    }
}

fn as_real(value: Value) -> Option<f64> {
    match value {
        Value::Integer(int) => Some(int as f64),
        Value::Real(real) => Some(real),
        _ => None,
    }
}

fn as_complex(value: Value) -> Option<Complex> {
    match value {
        Value::Integer(int) => Some(Complex::new(int as f64, 0.0)),
        Value::Real(real) => Some(Complex::new(real, 0.0)),
        Value::Complex(complex) => Some(complex),
        _ => None,
    }
}

fn as_string(value: Value) -> Option<String> {
    match value {
        Value::Integer(int) => Some(int.to_string()),
        Value::Real(real) => Some(real.to_string()),
        Value::Complex(complex) => Some(complex.to_string()),
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn unsupported(message: String) -> Error {
    Error::new(ErrorKind::UnsupportedType).with_message(message)
}
