//! Purpose: Provide an in-process bulletin board transport.
//! Exports: `MemoryTransport`.
//! Role: Embedding and test double that follows the board's lookup rules.
//! Invariants: Revisions are appended in post order and indexed from zero.
//! Invariants: A missing tag resolves only when the title has exactly one tag.
//! Invariants: Every primitive invocation is recorded in call order.
#![allow(clippy::result_large_err)]

use super::ApiResult;
use super::transport::Transport;
use crate::core::error::{Error, ErrorKind};
use crate::core::records::{RawBoardEntry, RawBulletinEntry, RawStatus};
use crate::core::typed::{Shaped, TypedValue};
use crate::core::value::Complex;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const DEFAULT_CAPACITY: u64 = 1 << 30;

#[derive(Debug)]
pub struct MemoryTransport {
    capacity: u64,
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    bulletins: BTreeMap<(String, String), Vec<Revision>>,
    calls: Vec<&'static str>,
    log: Vec<String>,
}

#[derive(Clone, Debug)]
struct Revision {
    value: TypedValue,
    timestamp: String,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is the byte count `memory_used(%)` is measured against.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Names of the primitives invoked so far, oldest first.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn begin(&self, call: &'static str) -> MutexGuard<'_, MemoryState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    fn post(&self, call: &'static str, title: &str, tag: &str, value: TypedValue) -> ApiResult<()> {
        let mut state = self.begin(call);
        let revision = Revision {
            value,
            timestamp: now_rfc3339(),
        };
        let revisions = state
            .bulletins
            .entry((title.to_string(), tag.to_string()))
            .or_default();
        revisions.push(revision);
        let index = revisions.len() - 1;
        state.write_log(format!("post {title}#{tag} revision {index}"));
        Ok(())
    }

    fn unsupported_archive(&self, call: &'static str) -> ApiResult<()> {
        drop(self.begin(call));
        Err(Error::new(ErrorKind::Usage)
            .with_message("archives are not supported by the in-memory board"))
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn resolve_tag(&self, title: &str, tag: Option<&str>) -> ApiResult<String> {
        if let Some(tag) = tag {
            return Ok(tag.to_string());
        }
        let tags: Vec<&String> = self
            .bulletins
            .keys()
            .filter(|(candidate, _)| candidate == title)
            .map(|(_, tag)| tag)
            .collect();
        match tags.as_slice() {
            [] => Err(not_found(title, None)),
            [tag] => Ok((*tag).clone()),
            _ => {
                let names: Vec<&str> = tags.iter().map(|tag| tag.as_str()).collect();
                Err(Error::new(ErrorKind::NotUnique)
                    .with_message(format!("multiple data found: {}", names.join(", ")))
                    .with_bulletin(title, None)
                    .with_hint("Pass a tag to select one of the bulletins."))
            }
        }
    }

    fn revisions(&self, title: &str, tag: Option<&str>) -> ApiResult<(String, &Vec<Revision>)> {
        let tag = self.resolve_tag(title, tag)?;
        match self.bulletins.get(&(title.to_string(), tag.clone())) {
            Some(revisions) => Ok((tag, revisions)),
            None => Err(not_found(title, Some(&tag))),
        }
    }

    fn write_log(&mut self, message: String) {
        self.log.push(format!("{} {message}", now_rfc3339()));
    }
}

impl Transport for MemoryTransport {
    fn post_integer(&self, title: &str, tag: &str, value: i64) -> ApiResult<()> {
        self.post("post_integer", title, tag, TypedValue::IntegerScalar(value))
    }

    fn post_real(&self, title: &str, tag: &str, value: f64) -> ApiResult<()> {
        self.post("post_real", title, tag, TypedValue::RealScalar(value))
    }

    fn post_complex(&self, title: &str, tag: &str, value: Complex) -> ApiResult<()> {
        self.post("post_complex", title, tag, TypedValue::ComplexScalar(value))
    }

    fn post_string(&self, title: &str, tag: &str, value: &str) -> ApiResult<()> {
        self.post("post_string", title, tag, TypedValue::StringScalar(value.to_string()))
    }

    fn post_integer_array(
        &self,
        title: &str,
        tag: &str,
        data: &[i64],
        shape: &[usize],
    ) -> ApiResult<()> {
        let value = TypedValue::IntegerArray(Shaped::new(data.to_vec(), shape.to_vec()));
        self.post("post_integer_array", title, tag, value)
    }

    fn post_real_array(
        &self,
        title: &str,
        tag: &str,
        data: &[f64],
        shape: &[usize],
    ) -> ApiResult<()> {
        let value = TypedValue::RealArray(Shaped::new(data.to_vec(), shape.to_vec()));
        self.post("post_real_array", title, tag, value)
    }

    fn post_complex_array(
        &self,
        title: &str,
        tag: &str,
        data: &[Complex],
        shape: &[usize],
    ) -> ApiResult<()> {
        let value = TypedValue::ComplexArray(Shaped::new(data.to_vec(), shape.to_vec()));
        self.post("post_complex_array", title, tag, value)
    }

    fn post_string_array(
        &self,
        title: &str,
        tag: &str,
        data: &[String],
        shape: &[usize],
    ) -> ApiResult<()> {
        let value = TypedValue::StringArray(Shaped::new(data.to_vec(), shape.to_vec()));
        self.post("post_string_array", title, tag, value)
    }

    fn read_raw(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<Vec<TypedValue>> {
        let state = self.begin("read_raw");
        let (tag, stored) = state.revisions(title, tag)?;
        if revisions.is_empty() {
            return match stored.last() {
                Some(latest) => Ok(vec![latest.value.clone()]),
                None => Err(not_found(title, Some(&tag))),
            };
        }
        revisions
            .iter()
            .map(|&revision| {
                usize::try_from(revision)
                    .ok()
                    .and_then(|index| stored.get(index))
                    .map(|entry| entry.value.clone())
                    .ok_or_else(|| not_found(title, Some(&tag)).with_revision(revision))
            })
            .collect()
    }

    fn status_raw(&self) -> ApiResult<RawStatus> {
        let state = self.begin("status_raw");
        let datasize: u64 = state
            .bulletins
            .values()
            .flatten()
            .map(|revision| revision.value.datasize())
            .sum();
        let percent = if self.capacity == 0 {
            0.0
        } else {
            datasize as f64 / self.capacity as f64 * 100.0
        };
        Ok((datasize, datasize, percent, state.bulletins.len() as u64, 0, 0))
    }

    fn view_board_raw(&self) -> ApiResult<Vec<RawBoardEntry>> {
        let state = self.begin("view_board_raw");
        Ok(state
            .bulletins
            .iter()
            .map(|((title, tag), revisions)| (title.clone(), tag.clone(), revisions.len() as u64))
            .collect())
    }

    fn get_info_raw(&self, title: &str, tag: Option<&str>) -> ApiResult<Vec<RawBulletinEntry>> {
        let state = self.begin("get_info_raw");
        let (_, stored) = state.revisions(title, tag)?;
        Ok(stored
            .iter()
            .enumerate()
            .map(|(index, revision)| {
                (
                    index as u64,
                    revision.value.datasize(),
                    revision.timestamp.clone(),
                    "memory".to_string(),
                )
            })
            .collect())
    }

    fn clear_revisions(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<()> {
        let mut state = self.begin("clear_revisions");
        let tag = state.resolve_tag(title, tag)?;
        let key = (title.to_string(), tag.clone());
        let Some(stored) = state.bulletins.get_mut(&key) else {
            return Err(not_found(title, Some(&tag)));
        };
        let mut index = 0u64;
        stored.retain(|_| {
            let keep = !revisions.contains(&index);
            index += 1;
            keep
        });
        if stored.is_empty() {
            state.bulletins.remove(&key);
        }
        state.write_log(format!("clear_revisions {title}#{tag} {revisions:?}"));
        Ok(())
    }

    fn remove(&self, title: &str, tag: Option<&str>) -> ApiResult<()> {
        let mut state = self.begin("remove");
        let tag = state.resolve_tag(title, tag)?;
        if state
            .bulletins
            .remove(&(title.to_string(), tag.clone()))
            .is_none()
        {
            return Err(not_found(title, Some(&tag)));
        }
        state.write_log(format!("remove {title}#{tag}"));
        Ok(())
    }

    fn relabel(
        &self,
        title_from: &str,
        tag_from: Option<&str>,
        title_to: Option<&str>,
        tag_to: Option<&str>,
    ) -> ApiResult<()> {
        let mut state = self.begin("relabel");
        let tag_from = state.resolve_tag(title_from, tag_from)?;
        let Some(moved) = state
            .bulletins
            .remove(&(title_from.to_string(), tag_from.clone()))
        else {
            return Err(not_found(title_from, Some(&tag_from)));
        };
        let title_to = title_to.unwrap_or(title_from).to_string();
        let tag_to = tag_to.map(str::to_string).unwrap_or_else(|| tag_from.clone());
        state
            .bulletins
            .entry((title_to.clone(), tag_to.clone()))
            .or_default()
            .extend(moved);
        state.write_log(format!("relabel {title_from}#{tag_from} -> {title_to}#{tag_to}"));
        Ok(())
    }

    fn archive(&self, _acv_name: &str, _title: &str, _tag: Option<&str>) -> ApiResult<()> {
        self.unsupported_archive("archive")
    }

    fn load(&self, _acv_name: &str) -> ApiResult<()> {
        self.unsupported_archive("load")
    }

    fn list_archive(&self) -> ApiResult<Vec<String>> {
        drop(self.begin("list_archive"));
        Ok(Vec::new())
    }

    fn rename_archive(&self, _name_from: &str, _name_to: &str) -> ApiResult<()> {
        self.unsupported_archive("rename_archive")
    }

    fn delete_archive(&self, _acv_name: &str) -> ApiResult<()> {
        self.unsupported_archive("delete_archive")
    }

    fn dump(&self, _acv_name: &str) -> ApiResult<()> {
        self.unsupported_archive("dump")
    }

    fn restore(&self, _acv_name: &str) -> ApiResult<()> {
        self.unsupported_archive("restore")
    }

    fn reset(&self) -> ApiResult<()> {
        let mut state = self.begin("reset");
        state.bulletins.clear();
        state.write_log("reset".to_string());
        Ok(())
    }

    fn clear_log(&self) -> ApiResult<()> {
        self.begin("clear_log").log.clear();
        Ok(())
    }

    fn log(&self) -> ApiResult<String> {
        let state = self.begin("log");
        Ok(state.log.iter().map(|line| format!("{line}\n")).collect())
    }

    fn server_version(&self) -> ApiResult<String> {
        drop(self.begin("server_version"));
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    fn terminate(&self) -> ApiResult<()> {
        drop(self.begin("terminate"));
        Ok(())
    }
}

fn not_found(title: &str, tag: Option<&str>) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("not found")
        .with_bulletin(title, tag)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
