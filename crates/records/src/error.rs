/// Failure reported by a persistence or rules collaborator.
/// Whenever a store returns one of these, nothing from the batch was applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected effect: {0}")]
    Rejected(String),
    #[error("store returned corrupt record: {0}")]
    Corrupt(String),
}
