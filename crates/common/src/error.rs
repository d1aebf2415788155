use thiserror::Error;

/// An error whose message is meant to be shown to the chat user verbatim.
///
/// Plugins raise these for input problems ("please provide a URL", "invalid
/// link"). The dispatch loop replies with the message; any other error is
/// logged and turned into a generic failure reply.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UserError(pub String);

/// Wrap a user-facing message into an [`anyhow::Error`].
#[must_use]
pub fn user_error(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(UserError(message.into()))
}

/// Bail out of a plugin handler with a user-facing message.
///
/// ```ignore
/// if args.is_empty() {
///     bail_user!("Please provide a YouTube URL. Example: {}ytv <url>", prefix);
/// }
/// ```
#[macro_export]
macro_rules! bail_user {
    ($($arg:tt)*) => {
        return Err($crate::user_error(format!($($arg)*)))
    };
}
