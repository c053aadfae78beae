//! Task name constants used to tag log lines and `RoundError`s with which
//! protocol is running.

pub const TASK_NAME_KEYGEN: &str = "ecdsa-keygen";
pub const TASK_NAME_SIGNING: &str = "ecdsa-signing";
pub const TASK_NAME_RESHARING: &str = "ecdsa-resharing";

/// Default task name referenced by round code that doesn't otherwise have a
/// specific protocol in scope.
pub const TASK_NAME: &str = TASK_NAME_KEYGEN;
