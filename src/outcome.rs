//! `{data, error}` style accessors for [`Result`].
//!
//! Every attempt resolves to a plain `Result<T, E>`: `Ok` carries the data,
//! `Err` carries the error, and exactly one of them is ever present.
//! [`Outcome`] adds accessors named after those two branches.

/// Accessors over the two branches of a `Result`.
///
/// # Examples
///
/// ```rust
/// use caught::Outcome;
///
/// let ok: Result<i32, String> = Ok(1);
/// assert_eq!(ok.data(), Some(&1));
/// assert_eq!(ok.error(), None);
///
/// let err: Result<i32, String> = Err("nope".to_string());
/// assert_eq!(err.data(), None);
/// assert_eq!(err.error().map(String::as_str), Some("nope"));
/// ```
pub trait Outcome<T, E> {
    /// The success value, if any.
    fn data(&self) -> Option<&T>;

    /// The failure value, if any.
    fn error(&self) -> Option<&E>;

    /// Split into `(data, error)`; exactly one side is `Some`.
    fn into_parts(self) -> (Option<T>, Option<E>);
}

impl<T, E> Outcome<T, E> for Result<T, E> {
    fn data(&self) -> Option<&T> {
        self.as_ref().ok()
    }

    fn error(&self) -> Option<&E> {
        self.as_ref().err()
    }

    fn into_parts(self) -> (Option<T>, Option<E>) {
        match self {
            Ok(data) => (Some(data), None),
            Err(error) => (None, Some(error)),
        }
    }
}
