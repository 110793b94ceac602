//! Purpose: Define the public Rust API boundary for typed bulletin board access.
//! Exports: Value/wire types, records, errors, the transport seam, and clients.
//! Role: Public, additive-only surface; `core` stays transport-free.
//! Invariants: Every board call goes through a `Transport` implementation.
//! Invariants: The default-context functions are thin wrappers over `BoardClient`.

mod client;
mod context;
mod gateway;
mod memory;
mod transport;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::records::{
    BoardListing, BoardStatus, BulletinListing, RawBoardEntry, RawBulletinEntry, RawStatus,
};
pub use crate::core::typed::{Shaped, TypedValue, WireType, classify};
pub use crate::core::value::{Complex, NdArray, Value};
pub use client::{BoardClient, Revisions};
pub use context::{
    ADDR_ENV, DEFAULT_ADDR, current_addr, default_client, get_info, post, read, set_addr, status,
    view_board,
};
pub use gateway::GatewayTransport;
pub use memory::MemoryTransport;
pub use transport::Transport;

pub type ApiResult<T> = Result<T, Error>;
