/// State of one subscribe operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressResource<T> {
    /// Number of channels inserted so far.
    InProgress(usize),
    Success(T),
    Failure(String),
    /// Informational end of the operation, not an error.
    Message(String),
}

impl<T> ProgressResource<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressResource::InProgress(_))
    }
}
