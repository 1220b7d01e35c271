use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// A Unix timestamp represented as a `u64`, in seconds since 1970-01-01T00:00:00Z.
///
/// Used as the freshness component of the login password.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

/// Local wall-clock time as `2024-03-04T13:21:00+0700`, the format of the `date_time` header.
pub fn local_date_time() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%z").to_string()
}
