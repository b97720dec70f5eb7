/// Errors raised while handling a message from a debugger.
///
/// None of these reach the running program: the debugger loop logs them as
/// warnings and drops the offending message.
#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    /// A payload was not valid JSON, or did not match the expected shape.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// A time-travel message carried an unusable payload.
    #[error("{0} message has some bad payload...")]
    BadPayload(&'static str),
    /// A required field was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A message type this debugger does not implement.
    #[error("This feature is not yet supported: {0}")]
    NotSupported(String),
}
