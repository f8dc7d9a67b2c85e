use std::ffi::{CStr, c_char};
use std::sync::OnceLock;

use super::codec::{ERROR_CAPACITY, decode_error, encode_error};
use super::host::{Host, HostError, init_tracing};
use crate::core::{Handle, ManagerBuilder};

static HOST: OnceLock<Host> = OnceLock::new();

/// Result record of both exported calls.
///
/// `err` holds a zero-terminated message; empty means success, and only then is
/// `handle` meaningful.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CollectorInstance {
    /// Zero-terminated UTF-8 error message; all zeros on success.
    pub err: [u8; ERROR_CAPACITY],
    /// Instance handle; `0` when creation failed.
    pub handle: u32,
}

impl CollectorInstance {
    /// Successful record for `handle` with an empty message.
    pub fn success(handle: Handle) -> Self {
        Self {
            err: [0; ERROR_CAPACITY],
            handle: handle.get(),
        }
    }

    /// Failed record carrying the invalid handle.
    pub fn failure(msg: &str) -> Self {
        let mut record = Self::success(Handle::INVALID);
        record.set_error(msg);
        record
    }

    /// Stores `msg`, truncated to fit `err`. The handle is left as is.
    pub fn set_error(&mut self, msg: &str) {
        encode_error(&mut self.err, msg);
    }

    /// The stored message, or `None` on success.
    pub fn error_message(&self) -> Option<String> {
        let msg = decode_error(&self.err);
        (!msg.is_empty()).then(|| msg.into_owned())
    }

    /// True if `err` holds the empty string.
    pub fn is_success(&self) -> bool {
        self.err[0] == 0
    }
}

impl std::fmt::Debug for CollectorInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorInstance")
            .field("err", &decode_error(&self.err))
            .field("handle", &self.handle)
            .finish()
    }
}

/// Installs the process-wide host used by [`NewCollector`] and [`ShutdownCollector`].
///
/// Also installs a `tracing` fmt subscriber unless one is already set.
///
/// # Errors
/// - [`HostError::AlreadyInstalled`] on a second call
/// - [`HostError::Runtime`] if the runtime cannot start
pub fn install(builder: ManagerBuilder) -> Result<&'static Host, HostError> {
    init_tracing();
    if HOST.get().is_some() {
        return Err(HostError::AlreadyInstalled);
    }
    let host = Host::new(builder)?;
    HOST.set(host).map_err(|_| HostError::AlreadyInstalled)?;
    HOST.get().ok_or(HostError::NotInstalled)
}

/// The installed host, if any.
pub fn installed() -> Option<&'static Host> {
    HOST.get()
}

/// Starts a collector from `config` (a `scheme:rest` URI) and waits until it runs.
///
/// `timeout_ms = 0` waits indefinitely.
///
/// # Safety
/// `config` must be null or point to a zero-terminated string valid for the call.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn NewCollector(config: *const c_char, timeout_ms: u32) -> CollectorInstance {
    let Some(host) = HOST.get() else {
        return CollectorInstance::failure(&HostError::NotInstalled.to_string());
    };
    // SAFETY: upheld by the caller.
    match unsafe { read_str(config) } {
        Ok(source) => host.create(source, timeout_ms),
        Err(e) => CollectorInstance::failure(&e.to_string()),
    }
}

/// Stops the collector under `handle`, waiting at most `timeout_ms` (`0` = indefinitely).
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "C" fn ShutdownCollector(handle: u32, timeout_ms: u32) -> CollectorInstance {
    match HOST.get() {
        Some(host) => host.shutdown(handle, timeout_ms),
        None => {
            let mut record = CollectorInstance::success(Handle::from_raw(handle));
            record.set_error(&HostError::NotInstalled.to_string());
            record
        }
    }
}

/// # Safety
/// `ptr` must be null or a valid zero-terminated string outliving `'a`.
unsafe fn read_str<'a>(ptr: *const c_char) -> Result<&'a str, HostError> {
    if ptr.is_null() {
        return Err(HostError::InvalidArgument {
            reason: "null configuration pointer",
        });
    }
    // SAFETY: non-null and zero-terminated per the contract above.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str().map_err(|_| HostError::InvalidArgument {
        reason: "configuration is not valid UTF-8",
    })
}
