//! Manager core: handle table, launch and shutdown.
//!
//! The public API from this module is [`Manager`] (built through [`ManagerBuilder`]),
//! the opaque [`Handle`] it issues and its [`ManagerConfig`].
//!
//! Internal modules:
//! - [`completion`]: spawns a service task and settles its one-shot result;
//! - [`table`]: the mutex-guarded handle → instance map;
//! - [`launcher`]: resolve, validate, spawn and poll until running;
//! - [`shutdown`]: cancel and wait, for one instance or all of them.

mod builder;
mod completion;
mod config;
mod handle;
mod launcher;
mod manager;
mod shutdown;
mod table;

pub use builder::ManagerBuilder;
pub use config::{ENV_PREFIX, ManagerConfig, TimeoutPolicy, timeout_from_millis};
pub use handle::Handle;
pub use manager::Manager;
pub use table::InstanceStatus;
