//! # C boundary.
//!
//! Two exported functions drive the process-wide [`Host`]:
//!
//! ```c
//! struct CollectorInstance { char err[128]; uint32_t handle; };
//!
//! struct CollectorInstance NewCollector(const char *config, uint32_t timeout_ms);
//! struct CollectorInstance ShutdownCollector(uint32_t handle, uint32_t timeout_ms);
//! ```
//!
//! The embedding program calls [`install`] once with a
//! [`ManagerBuilder`](crate::ManagerBuilder) carrying its service factory; until
//! then both functions report `"collector host not installed"`.
//!
//! ## Rules
//! - An empty `err` means success; `handle` is `0` whenever creation failed.
//! - `timeout_ms = 0` waits indefinitely.
//! - Panics never cross the boundary; they are reported through `err`.
#![warn(missing_docs)]

mod codec;
mod exports;
mod host;

pub use codec::{ERROR_CAPACITY, ErrorBuffer, decode_error, encode_error};
pub use exports::{CollectorInstance, NewCollector, ShutdownCollector, install, installed};
pub use host::{Host, HostError, init_tracing};
