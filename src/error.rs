//! Unified lifecycle error type.

use std::fmt;

/// The error type returned by senda's fallible lifecycle operations.
///
/// Request-level failures never reach this type: a bad payload or a faulting
/// handler is expressed as a [`Fault`](crate::Fault) and answered inside the
/// middleware chain. `Error` surfaces the two failures the caller of
/// [`Server::serve`](crate::Server::serve) must act on: the listener could
/// not be acquired, or shutdown ran out of grace period with requests still
/// in flight.
#[derive(Debug)]
pub enum Error {
    /// Binding or accepting on the listener failed.
    Io(std::io::Error),
    /// In-flight requests did not drain before the grace period elapsed.
    /// The remaining connections were severed.
    ShutdownTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::ShutdownTimeout => f.write_str("graceful shutdown deadline exceeded"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ShutdownTimeout => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
