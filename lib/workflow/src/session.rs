//! Stale-response guard for the editor's in-flight requests.
//!
//! The editor fires template loads and test runs without awaiting earlier
//! ones. Responses apply last-write-wins: each request captures a token at
//! dispatch, and a response is dropped unless its token is still current.

/// Monotonic generation counter owned by one editor session.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: u64,
}

/// Token captured when a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, invalidating all earlier tokens.
    pub fn begin(&mut self) -> RequestToken {
        self.current += 1;
        RequestToken(self.current)
    }

    /// Whether a response carrying this token may still be applied.
    #[must_use]
    pub fn is_current(&self, token: &RequestToken) -> bool {
        token.0 == self.current
    }

    /// Drops all outstanding tokens without starting a request, e.g. when
    /// the editor navigates away.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_request_wins() {
        let mut generation = RequestGeneration::new();
        let first = generation.begin();
        let second = generation.begin();

        // The slow first response arrives after the second dispatch.
        assert!(!generation.is_current(&first));
        assert!(generation.is_current(&second));
    }

    #[test]
    fn invalidate_drops_outstanding_tokens() {
        let mut generation = RequestGeneration::new();
        let token = generation.begin();
        assert!(generation.is_current(&token));

        generation.invalidate();
        assert!(!generation.is_current(&token));
    }
}
