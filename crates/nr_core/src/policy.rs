use tracing::warn;

use crate::Result;

/// How a call site treats a failed step.
///
/// `BestEffort` logs the failure and carries on with an empty value, which is
/// what the background refresher and the bucket read path want. `Strict`
/// hands the error back to the caller. Cancellation is never absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    BestEffort,
    Strict,
}

impl FailurePolicy {
    pub fn apply<T: Default>(self, context: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if self == FailurePolicy::BestEffort && !e.is_cancelled() => {
                warn!(context, error = %e, "⚠️ Step failed, continuing with an empty result");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_best_effort_substitutes_default() {
        let failed: Result<Vec<u32>> = Err(Error::UpstreamUnavailable("down".to_string()));
        let value = FailurePolicy::BestEffort.apply("fetch", failed).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_strict_propagates() {
        let failed: Result<()> = Err(Error::Storage("write refused".to_string()));
        let err = FailurePolicy::Strict.apply("push", failed).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_best_effort_keeps_cancellation() {
        let cancelled: Result<Vec<u32>> = Err(Error::Cancelled);
        let err = FailurePolicy::BestEffort.apply("fetch", cancelled).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_success_passes_through() {
        assert_eq!(FailurePolicy::Strict.apply("ok", Ok(3)).unwrap(), 3);
        assert_eq!(FailurePolicy::BestEffort.apply("ok", Ok(3)).unwrap(), 3);
    }
}
