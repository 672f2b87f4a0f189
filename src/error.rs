use thiserror::Error;

/// LlrbError enumerates over all possible errors that this package
/// shall return. Missing keys are not errors, lookups return `None`.
#[derive(Debug, Error, PartialEq)]
pub enum LlrbError<K> {
    /// Fatal case, two consecutive red links on a path.
    #[error("consecutive red links")]
    ConsecutiveReds,
    /// Fatal case, a red link leaning to the right.
    #[error("right leaning red link")]
    RightLeaningRed,
    /// Fatal case, breaking the black balance. The String component of
    /// this variant can be used for debugging.
    #[error("unbalanced blacks {0}")]
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    #[error("sort error {0:?} {1:?}")]
    SortError(K, K),
    /// Fatal case, cached subtree size is (expected, found).
    #[error("subtree size mismatch expected:{0} found:{1}")]
    SizeMismatch(usize, usize),
    /// Fatal case, root of a non-empty tree is red.
    #[error("root is red")]
    RedRoot,
    /// Returned by create() API when key is already present.
    #[error("key already present")]
    OverwriteKey,
}

impl<K> LlrbError<K> {
    /// Name of the error variant, without its payload. Useful for
    /// logging errors whose key type cannot be formatted.
    pub fn kind(&self) -> &'static str {
        match self {
            LlrbError::ConsecutiveReds => "ConsecutiveReds",
            LlrbError::RightLeaningRed => "RightLeaningRed",
            LlrbError::UnbalancedBlacks(_) => "UnbalancedBlacks",
            LlrbError::SortError(_, _) => "SortError",
            LlrbError::SizeMismatch(_, _) => "SizeMismatch",
            LlrbError::RedRoot => "RedRoot",
            LlrbError::OverwriteKey => "OverwriteKey",
        }
    }
}
