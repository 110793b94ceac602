//! Purpose: Typed value marshalling for bulletin board data stores.
//! Exports: `api` (public client surface) and `core` (values, wire types, records, errors).
//! Role: Library backing the `bbtyped` CLI and embedding applications.
//! Invariants: `core` performs no I/O; all board traffic goes through `api::Transport`.
//! Invariants: Connection context is explicit; the process-wide address is a convenience.
pub mod api;
pub mod core;
