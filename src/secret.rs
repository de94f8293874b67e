use std::fmt;

/// A wrapper that keeps credentials out of logs.
///
/// The reporting API key lives in a `Secret<String>` from the moment it is
/// read out of host configuration. `Debug` and `Display` always print
/// `[REDACTED]`, so configuration structs can derive `Debug` and be logged
/// freely.
///
/// # Examples
///
/// ```
/// use faultline::Secret;
///
/// let api_key = Secret::new("hb-1234".to_string());
/// assert_eq!(format!("{:?}", api_key), "[REDACTED]");
/// assert_eq!(api_key.expose_secret(), "hb-1234");
/// ```
// Do NOT derive Clone or Default: copies must go through expose_secret().
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
