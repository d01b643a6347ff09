//! Accumulates translator errors across a run so that a single invocation surfaces every
//! unsupported construct it finds instead of failing at the first one (spec §7).

use crate::error::TranspileError;
use tracing::warn;

#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<TranspileError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error and continues; the caller is expected to keep translating wherever it
    /// safely can.
    pub fn push(&mut self, error: TranspileError) {
        warn!(%error, "unsupported construct encountered during translation");
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TranspileError] {
        &self.errors
    }

    /// Consumes the collector: `Ok(ok)` if nothing was recorded, otherwise `Err` with every
    /// recorded message joined by newlines, per §7.
    pub fn into_result<T>(self, ok: T) -> Result<T, String> {
        if self.errors.is_empty() {
            Ok(ok)
        } else {
            Err(self
                .errors
                .into_iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_returns_ok() {
        let d = Diagnostics::new();
        assert_eq!(d.into_result("c code").unwrap(), "c code");
    }

    #[test]
    fn every_pushed_error_is_joined() {
        let mut d = Diagnostics::new();
        d.push(TranspileError::unsupported_node("Closure"));
        d.push(TranspileError::unsupported("for-in is not supported"));
        assert!(d.has_errors());
        let joined = d.into_result("unused").unwrap_err();
        assert_eq!(joined.lines().count(), 2);
        assert!(joined.contains("Closure"));
        assert!(joined.contains("for-in"));
    }
}
