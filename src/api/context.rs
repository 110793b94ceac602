//! Purpose: Hold the process-wide default gateway address and its convenience calls.
//! Exports: `set_addr`, `current_addr`, `default_client`, `post`, `read`, `status`,
//! `view_board`, `get_info`, `ADDR_ENV`, `DEFAULT_ADDR`.
//! Role: Boundary wrapper for callers that do not carry a `BoardClient` around.
//! Invariants: Each call resolves the address when it starts; later `set_addr`
//! calls affect only calls that start afterwards.
//! Invariants: No address validation happens until a transport is built.
#![allow(clippy::result_large_err)]

use super::ApiResult;
use super::client::{BoardClient, Revisions};
use super::gateway::GatewayTransport;
use crate::core::records::{BoardListing, BoardStatus, BulletinListing};
use crate::core::value::Value;
use std::sync::RwLock;

pub const ADDR_ENV: &str = "BB_GATEWAY_ADDR";
pub const DEFAULT_ADDR: &str = "127.0.0.1:7579";

static CONFIGURED_ADDR: RwLock<Option<String>> = RwLock::new(None);

/// Sets the address used by every later default-context call.
pub fn set_addr(addr: impl Into<String>) {
    let addr = addr.into();
    tracing::debug!(addr = %addr, "default gateway address set");
    let mut slot = CONFIGURED_ADDR
        .write()
        .unwrap_or_else(|poison| poison.into_inner());
    *slot = Some(addr);
}

/// Address for the next default-context call: `set_addr`, then `BB_GATEWAY_ADDR`,
/// then `127.0.0.1:7579`. The board's own `BB_ADDR` and port 7578 are left to
/// native clients.
pub fn current_addr() -> String {
    let configured = CONFIGURED_ADDR
        .read()
        .unwrap_or_else(|poison| poison.into_inner())
        .clone();
    resolve_addr(configured, std::env::var(ADDR_ENV).ok())
}

fn resolve_addr(configured: Option<String>, env: Option<String>) -> String {
    configured
        .or(env.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

pub fn default_client() -> ApiResult<BoardClient<GatewayTransport>> {
    GatewayTransport::new(current_addr()).map(BoardClient::new)
}

pub fn post(title: &str, tag: &str, value: impl Into<Value>) -> ApiResult<()> {
    default_client()?.post(title, tag, value)
}

pub fn read(title: &str, tag: Option<&str>, revisions: &[u64]) -> ApiResult<Revisions> {
    default_client()?.read(title, tag, revisions)
}

pub fn status() -> ApiResult<BoardStatus> {
    default_client()?.status()
}

pub fn view_board() -> ApiResult<Vec<BoardListing>> {
    default_client()?.view_board()
}

pub fn get_info(title: &str, tag: Option<&str>) -> ApiResult<Vec<BulletinListing>> {
    default_client()?.get_info(title, tag)
}
