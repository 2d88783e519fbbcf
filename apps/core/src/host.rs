/// The launcher surface the dispatch engine reports to. Calls are pass-through:
/// nothing is queued or retried.
pub trait Host {
    fn confirm(&self, message: &str) -> bool;
    fn notify(&self, message: &str);
    fn hide_window(&self);
}
