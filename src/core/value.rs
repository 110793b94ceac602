//! Purpose: Model the dynamic application value that callers post and read back.
//! Exports: `Value`, `Complex`, `NdArray`.
//! Role: Transport-free input/output of the classifier and reconstructor.
//! Invariants: `NdArray` data is flat, row-major, and `product(shape) == data.len()`.
//! Invariants: List normalization never recurses past the nesting it is given.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{}-{}j", self.re, -self.im)
        } else {
            write!(f, "{}+{}j", self.re, self.im)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Complex(Complex),
    String(String),
    List(Vec<Value>),
    Array(NdArray),
}

impl Value {
    /// Short label for the runtime type, used in error messages and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Complex(_) => "complex",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Array(_) => "array",
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(flag) => Ok(Value::Bool(*flag)),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(Value::Integer(int))
                } else {
                    number.as_f64().map(Value::Real).ok_or_else(|| {
                        Error::new(ErrorKind::UnsupportedType)
                            .with_message(format!("number {number} is not representable"))
                    })
                }
            }
            serde_json::Value::String(text) => Ok(Value::String(text.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            serde_json::Value::Object(map) => complex_from_json(map),
        }
    }

    /// Arrays render as nested lists following their shape.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(flag) => json!(flag),
            Value::Integer(int) => json!(int),
            Value::Real(real) => json!(real),
            Value::Complex(complex) => json!({ "re": complex.re, "im": complex.im }),
            Value::String(text) => json!(text),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Array(array) => array.to_json(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<Complex> for Value {
    fn from(value: Complex) -> Self {
        Value::Complex(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NdArray> for Value {
    fn from(value: NdArray) -> Self {
        Value::Array(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

fn complex_from_json(map: &Map<String, serde_json::Value>) -> Result<Value, Error> {
    let part = |key: &str| map.get(key).and_then(serde_json::Value::as_f64);
    match (map.len(), part("re"), part("im")) {
        (2, Some(re), Some(im)) => Ok(Value::Complex(Complex::new(re, im))),
        _ => Err(Error::new(ErrorKind::UnsupportedType)
            .with_message("objects other than {\"re\": x, \"im\": y} are not supported")),
    }
}

/// A shaped, row-major array of scalar elements.
#[derive(Clone, Debug, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<Value>,
}

impl NdArray {
    pub fn new(shape: Vec<usize>, data: Vec<Value>) -> Result<Self, Error> {
        if shape.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("array shape must have at least one dimension"));
        }
        let size = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("shape {shape:?} overflows the addressable size"))
            })?;
        if size != data.len() {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "shape {shape:?} holds {size} elements but data has {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Builds a one-dimensional array.
    pub fn from_vec<T: Into<Value>>(data: Vec<T>) -> Self {
        let data: Vec<Value> = data.into_iter().map(Into::into).collect();
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Normalizes nested lists into a shaped array.
    ///
    /// Sub-lists of equal length become further dimensions; the first non-list
    /// level becomes the element level. `[]` yields shape `[0]`.
    ///
    /// Scalar elements are promoted to one common type, in the order
    /// bool < integer < real < complex < string. Lists holding anything else
    /// keep their elements unchanged.
    pub fn from_list(items: Vec<Value>) -> Result<Self, Error> {
        let mut shape = vec![items.len()];
        let mut level = items;
        while let Some(Value::List(first)) = level.first() {
            let width = first.len();
            let mut next = Vec::with_capacity(level.len() * width);
            for (index, item) in level.into_iter().enumerate() {
                match item {
                    Value::List(inner) if inner.len() == width => next.extend(inner),
                    other => {
                        return Err(Error::new(ErrorKind::UnsupportedType).with_message(format!(
                            "ragged nested sequence at dimension {} (entry {index} is {})",
                            shape.len(),
                            describe_ragged(&other)
                        )));
                    }
                }
            }
            shape.push(width);
            level = next;
        }
        Ok(Self {
            shape,
            data: promote(level),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Splits into `(shape, flat row-major data)`.
    pub fn into_parts(self) -> (Vec<usize>, Vec<Value>) {
        (self.shape, self.data)
    }

    /// Element at a multi-dimensional index, last dimension fastest.
    pub fn get(&self, index: &[usize]) -> Option<&Value> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset)
    }

    pub fn to_json(&self) -> serde_json::Value {
        nest_json(&self.shape, &self.data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ElementKind {
    Bool,
    Integer,
    Real,
    Complex,
    String,
}

fn element_kind(value: &Value) -> Option<ElementKind> {
    match value {
        Value::Bool(_) => Some(ElementKind::Bool),
        Value::Integer(_) => Some(ElementKind::Integer),
        Value::Real(_) => Some(ElementKind::Real),
        Value::Complex(_) => Some(ElementKind::Complex),
        Value::String(_) => Some(ElementKind::String),
        _ => None,
    }
}

fn promote(data: Vec<Value>) -> Vec<Value> {
    let common = data
        .iter()
        .map(element_kind)
        .try_fold(ElementKind::Bool, |acc, kind| kind.map(|kind| acc.max(kind)));
    match common {
        Some(kind) => data.into_iter().map(|value| promote_to(value, kind)).collect(),
        None => data,
    }
}

fn promote_to(value: Value, kind: ElementKind) -> Value {
    match (kind, value) {
        (ElementKind::Integer, Value::Bool(flag)) => Value::Integer(i64::from(flag)),
        (ElementKind::Real, Value::Bool(flag)) => Value::Real(f64::from(u8::from(flag))),
        (ElementKind::Real, Value::Integer(int)) => Value::Real(int as f64),
        (ElementKind::Complex, Value::Bool(flag)) => {
            Value::Complex(Complex::new(f64::from(u8::from(flag)), 0.0))
        }
        (ElementKind::Complex, Value::Integer(int)) => {
            Value::Complex(Complex::new(int as f64, 0.0))
        }
        (ElementKind::Complex, Value::Real(real)) => Value::Complex(Complex::new(real, 0.0)),
        (ElementKind::String, Value::String(text)) => Value::String(text),
        (ElementKind::String, other) => Value::String(element_text(&other)),
        (_, value) => value,
    }
}

/// Text of a scalar placed in a string array.
fn element_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Integer(int) => int.to_string(),
        Value::Real(real) => real_text(*real),
        Value::Complex(complex) => format!("({complex})"),
        Value::String(text) => text.clone(),
        other => other.type_name().to_string(),
    }
}

fn real_text(real: f64) -> String {
    if real.is_nan() {
        "nan".to_string()
    } else if real == f64::INFINITY {
        "inf".to_string()
    } else if real == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{real:?}")
    }
}

fn describe_ragged(item: &Value) -> String {
    match item {
        Value::List(inner) => format!("a list of length {}", inner.len()),
        other => format!("a {}", other.type_name()),
    }
}

fn nest_json(shape: &[usize], data: &[Value]) -> serde_json::Value {
    match shape {
        [] | [_] => serde_json::Value::Array(data.iter().map(Value::to_json).collect()),
        [_, rest @ ..] => {
            let stride: usize = rest.iter().product();
            if stride == 0 {
                return serde_json::Value::Array(
                    (0..shape[0]).map(|_| nest_json(rest, &[])).collect(),
                );
            }
            serde_json::Value::Array(
                data.chunks(stride)
                    .map(|chunk| nest_json(rest, chunk))
                    .collect(),
            )
        }
    }
}
