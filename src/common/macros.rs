//! Small helpers shared by protocol round implementations.

/// Builds a `std::io::Error` from a format string. Used as the "I have no
/// more specific error type" fallback when constructing a `RoundError` via
/// `Round::wrap_error`/`Party::wrap_error`.
#[macro_export]
macro_rules! terr {
    ($($arg:tt)*) => {
        std::io::Error::new(std::io::ErrorKind::Other, format!($($arg)*))
    };
}
