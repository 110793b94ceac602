//! Purpose: Post and read application values through a bulletin board transport.
//! Exports: `BoardClient`, `Revisions`.
//! Role: Encoder (classify then dispatch) and reconstructor (reshape then unwrap).
//! Invariants: Each `post` issues exactly one transport primitive.
//! Invariants: `read` preserves the order in which revisions were requested.
//! Invariants: No retries, no wrapping of transport errors.
#![allow(clippy::result_large_err)]

use super::ApiResult;
use super::transport::Transport;
use crate::core::records::{
    BoardListing, BoardStatus, BulletinListing, board_listings, bulletin_listings,
};
use crate::core::typed::{TypedValue, classify};
use crate::core::value::Value;

/// Result of a read: a bare value for a single entry, otherwise all of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Revisions {
    One(Value),
    Many(Vec<Value>),
}

impl Revisions {
    fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            if let Some(value) = values.pop() {
                return Revisions::One(value);
            }
        }
        Revisions::Many(values)
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Revisions::One(value) => vec![value],
            Revisions::Many(values) => values,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Revisions::One(value) => value.to_json(),
            Revisions::Many(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoardClient<T> {
    transport: T,
}

impl<T: Transport> BoardClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn post(&self, title: &str, tag: &str, value: impl Into<Value>) -> ApiResult<()> {
        let typed = classify(value.into())?;
        self.post_typed(title, tag, &typed)
    }

    /// Sends an already classified value to its matching primitive.
    pub fn post_typed(&self, title: &str, tag: &str, typed: &TypedValue) -> ApiResult<()> {
        tracing::debug!(
            title,
            tag,
            wire = %typed.wire_type(),
            shape = ?typed.shape(),
            "post"
        );
        let transport = &self.transport;
        match typed {
            TypedValue::IntegerScalar(int) => transport.post_integer(title, tag, *int),
            TypedValue::RealScalar(real) => transport.post_real(title, tag, *real),
            TypedValue::ComplexScalar(complex) => transport.post_complex(title, tag, *complex),
            TypedValue::StringScalar(text) => transport.post_string(title, tag, text),
            TypedValue::IntegerArray(array) => {
                transport.post_integer_array(title, tag, &array.data, &array.shape)
            }
            TypedValue::RealArray(array) => {
                transport.post_real_array(title, tag, &array.data, &array.shape)
            }
            TypedValue::ComplexArray(array) => {
                transport.post_complex_array(title, tag, &array.data, &array.shape)
            }
            TypedValue::StringArray(array) => {
                transport.post_string_array(title, tag, &array.data, &array.shape)
            }
        }
    }

    /// Reads revisions of a bulletin; the latest one when `revisions` is empty.
    pub fn read(&self, title: &str, tag: Option<&str>, revisions: &[u64]) -> ApiResult<Revisions> {
        tracing::debug!(title, tag, ?revisions, "read");
        let raw = self.transport.read_raw(title, tag, revisions)?;
        let values = raw
            .into_iter()
            .map(|entry| entry.into_value().map_err(|err| err.with_bulletin(title, tag)))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Revisions::from_values(values))
    }

    pub fn status(&self) -> ApiResult<BoardStatus> {
        self.transport.status_raw().map(BoardStatus::from_raw)
    }

    pub fn view_board(&self) -> ApiResult<Vec<BoardListing>> {
        self.transport.view_board_raw().map(board_listings)
    }

    pub fn get_info(&self, title: &str, tag: Option<&str>) -> ApiResult<Vec<BulletinListing>> {
        self.transport.get_info_raw(title, tag).map(bulletin_listings)
    }

    pub fn clear_revisions(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<()> {
        self.transport.clear_revisions(title, tag, revisions)
    }

    pub fn remove(&self, title: &str, tag: Option<&str>) -> ApiResult<()> {
        self.transport.remove(title, tag)
    }

    pub fn relabel(
        &self,
        title_from: &str,
        tag_from: Option<&str>,
        title_to: Option<&str>,
        tag_to: Option<&str>,
    ) -> ApiResult<()> {
        self.transport.relabel(title_from, tag_from, title_to, tag_to)
    }

    pub fn archive(&self, acv_name: &str, title: &str, tag: Option<&str>) -> ApiResult<()> {
        self.transport.archive(acv_name, title, tag)
    }

    pub fn load(&self, acv_name: &str) -> ApiResult<()> {
        self.transport.load(acv_name)
    }

    pub fn list_archive(&self) -> ApiResult<Vec<String>> {
        self.transport.list_archive()
    }

    pub fn rename_archive(&self, name_from: &str, name_to: &str) -> ApiResult<()> {
        self.transport.rename_archive(name_from, name_to)
    }

    pub fn delete_archive(&self, acv_name: &str) -> ApiResult<()> {
        self.transport.delete_archive(acv_name)
    }

    pub fn dump(&self, acv_name: &str) -> ApiResult<()> {
        self.transport.dump(acv_name)
    }

    pub fn restore(&self, acv_name: &str) -> ApiResult<()> {
        self.transport.restore(acv_name)
    }

    pub fn reset(&self) -> ApiResult<()> {
        self.transport.reset()
    }

    pub fn clear_log(&self) -> ApiResult<()> {
        self.transport.clear_log()
    }

    pub fn log(&self) -> ApiResult<String> {
        self.transport.log()
    }

    pub fn server_version(&self) -> ApiResult<String> {
        self.transport.server_version()
    }

    pub fn terminate(&self) -> ApiResult<()> {
        self.transport.terminate()
    }
}
