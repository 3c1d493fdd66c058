//! Humanized operation outcomes handed to presentation code

/// Final, already-humanized result of a gateway operation.
///
/// Presentation code matches on this instead of inspecting HTTP statuses.
/// `Cancelled` and `Skipped` carry nothing to render and should be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Ready(T),
    /// Degraded but not an error (fallback mode, please-wait after a rate limit).
    Notice { message: String },
    /// The operation failed; `message` is safe to show to the user.
    Failed { message: String },
    /// The session token was rejected and has been cleared; re-authenticate.
    SignedOut,
    /// The owning view session was cancelled before the request settled.
    Cancelled,
    /// Throttled, superseded by a newer call, or nothing to do.
    Skipped,
}

impl<T> Outcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    /// The value, if the operation succeeded.
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            _ => None,
        }
    }

    /// The user-facing message for `Notice` and `Failed`.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Notice { message } | Outcome::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(v) => Outcome::Ready(f(v)),
            Outcome::Notice { message } => Outcome::Notice { message },
            Outcome::Failed { message } => Outcome::Failed { message },
            Outcome::SignedOut => Outcome::SignedOut,
            Outcome::Cancelled => Outcome::Cancelled,
            Outcome::Skipped => Outcome::Skipped,
        }
    }
}
