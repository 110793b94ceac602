//! Purpose: Declare the typed RPC primitives a bulletin board transport provides.
//! Exports: `Transport`.
//! Role: The seam between value marshalling and whatever moves bytes to a board.
//! Invariants: Calls are synchronous; failures propagate to the caller as-is.
//! Invariants: Array primitives take flat row-major data plus its shape.
#![allow(clippy::result_large_err)]

use super::ApiResult;
use crate::core::records::{RawBoardEntry, RawBulletinEntry, RawStatus};
use crate::core::typed::TypedValue;
use crate::core::value::Complex;

pub trait Transport {
    fn post_integer(&self, title: &str, tag: &str, value: i64) -> ApiResult<()>;

    fn post_real(&self, title: &str, tag: &str, value: f64) -> ApiResult<()>;

    fn post_complex(&self, title: &str, tag: &str, value: Complex) -> ApiResult<()>;

    fn post_string(&self, title: &str, tag: &str, value: &str) -> ApiResult<()>;

    fn post_integer_array(
        &self,
        title: &str,
        tag: &str,
        data: &[i64],
        shape: &[usize],
    ) -> ApiResult<()>;

    fn post_real_array(&self, title: &str, tag: &str, data: &[f64], shape: &[usize])
    -> ApiResult<()>;

    fn post_complex_array(
        &self,
        title: &str,
        tag: &str,
        data: &[Complex],
        shape: &[usize],
    ) -> ApiResult<()>;

    fn post_string_array(
        &self,
        title: &str,
        tag: &str,
        data: &[String],
        shape: &[usize],
    ) -> ApiResult<()>;

    /// One entry per requested revision, in request order; the latest when
    /// `revisions` is empty. A `None` tag is resolved by the board when the
    /// title has exactly one tag.
    fn read_raw(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<Vec<TypedValue>>;

    fn status_raw(&self) -> ApiResult<RawStatus>;

    fn view_board_raw(&self) -> ApiResult<Vec<RawBoardEntry>>;

    fn get_info_raw(&self, title: &str, tag: Option<&str>) -> ApiResult<Vec<RawBulletinEntry>>;

    fn clear_revisions(&self, title: &str, tag: Option<&str>, revisions: &[u64])
    -> ApiResult<()>;

    /// Removes every revision and the board entry itself.
    fn remove(&self, title: &str, tag: Option<&str>) -> ApiResult<()>;

    fn relabel(
        &self,
        title_from: &str,
        tag_from: Option<&str>,
        title_to: Option<&str>,
        tag_to: Option<&str>,
    ) -> ApiResult<()>;

    fn archive(&self, acv_name: &str, title: &str, tag: Option<&str>) -> ApiResult<()>;

    fn load(&self, acv_name: &str) -> ApiResult<()>;

    fn list_archive(&self) -> ApiResult<Vec<String>>;

    /// Takes effect after the next `reset`.
    fn rename_archive(&self, name_from: &str, name_to: &str) -> ApiResult<()>;

    /// Takes effect after the next `reset`.
    fn delete_archive(&self, acv_name: &str) -> ApiResult<()>;

    fn dump(&self, acv_name: &str) -> ApiResult<()>;

    fn restore(&self, acv_name: &str) -> ApiResult<()>;

    fn reset(&self) -> ApiResult<()>;

    fn clear_log(&self) -> ApiResult<()>;

    fn log(&self) -> ApiResult<String>;

    fn server_version(&self) -> ApiResult<String>;

    fn terminate(&self) -> ApiResult<()>;
}
