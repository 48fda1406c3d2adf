//! Bucket keys and TAT values.

use std::borrow::Borrow;
use std::fmt;
use std::time::SystemTime;

/// Theoretical arrival time of a bucket.
///
/// Stores treat this as an opaque point in time; computing and interpreting it
/// is the rate limiter's job.
pub type Tat = SystemTime;

/// Separator used by [`BucketKey::new`] between the limit name and the subject id.
pub const KEY_SEPARATOR: char = ':';

/// Opaque identifier of one rate limit bucket.
///
/// Conventionally `"<limit name>:<subject id>"`. Stores compare keys for
/// equality only; callers are responsible for keeping keys of different
/// limits from colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey(String);

impl BucketKey {
    /// Build the conventional `name:id` key.
    pub fn new(name: impl AsRef<str>, id: impl AsRef<str>) -> Self {
        let (name, id) = (name.as_ref(), id.as_ref());
        let mut key = String::with_capacity(name.len() + id.len() + 1);
        key.push_str(name);
        key.push(KEY_SEPARATOR);
        key.push_str(id);
        Self(key)
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key at the first separator into `(name, id)`.
    ///
    /// Returns `None` for keys that were not built in the `name:id` form.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once(KEY_SEPARATOR)
    }

    /// Consume the key, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BucketKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for BucketKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl AsRef<str> for BucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BucketKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
