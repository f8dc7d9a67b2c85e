use std::fmt;

/// Opaque identifier of one live service instance.
///
/// Handles are drawn pseudo-randomly and are unique among live instances only;
/// a value may come back after its instance was removed. `0` is never issued.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// The invalid handle, reported at the boundary when creation fails.
    pub const INVALID: Handle = Handle(0);

    /// Wraps a raw value received from the boundary.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value for the boundary.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True unless this is [`Handle::INVALID`].
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
