/// User-visible error channel. Callable from workers.
pub trait ErrorSink: Send + Sync {
    fn surface_error(&self, message: &str);
}

/// Command-log and diagnostics channel.
pub trait ActionLog: Send + Sync {
    /// Records that a named action is about to run.
    fn log_action(&self, label: &str);
    /// Records a failure that must not interrupt the user.
    fn log_error(&self, message: &str);
}
