//! Endpoint Registry
//!
//! Ordered candidate base URLs of the inference service plus a cursor
//! pointing at the preferred one. Pure domain logic, no I/O.

use crate::domain::entities::EndpointCandidate;
use crate::domain::errors::ConfigError;
use std::sync::Arc;

/// Ordered, immutable list of endpoint candidates with a movable cursor.
///
/// The candidate list is shared between clones; only the cursor is
/// per-instance. The cursor always indexes a valid candidate.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    candidates: Arc<[EndpointCandidate]>,
    cursor: usize,
}

impl EndpointRegistry {
    /// Build a registry from URLs in preference order.
    ///
    /// Duplicate URLs (after trailing-slash normalization) keep their first
    /// position only, so a probe cycle never hits the same URL twice.
    pub fn new<I, S>(urls: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<EndpointCandidate> = Vec::new();
        for url in urls {
            let candidate = EndpointCandidate::new(url);
            if candidate.base_url.is_empty() || candidates.contains(&candidate) {
                continue;
            }
            candidates.push(candidate);
        }

        if candidates.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        Ok(Self {
            candidates: candidates.into(),
            cursor: 0,
        })
    }

    pub fn current_endpoint(&self) -> &EndpointCandidate {
        &self.candidates[self.cursor]
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// Move to the next candidate, wrapping after the last one.
    pub fn advance(&mut self) -> &EndpointCandidate {
        self.cursor = (self.cursor + 1) % self.candidates.len();
        tracing::info!("switched to inference endpoint {}", self.current_endpoint());
        self.current_endpoint()
    }

    /// True once the cursor is back at `start_index`.
    ///
    /// Meaningful after at least one `advance()` since the cycle began.
    pub fn has_cycled(&self, start_index: usize) -> bool {
        self.cursor == start_index
    }

    /// Point the cursor at `index`. Out-of-range indexes are ignored.
    pub fn restore(&mut self, index: usize) -> bool {
        if index < self.candidates.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn candidates(&self) -> &[EndpointCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(n: usize) -> EndpointRegistry {
        EndpointRegistry::new((0..n).map(|i| format!("http://10.0.0.{}:5000", i))).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_list() {
        let urls: Vec<String> = Vec::new();
        assert_eq!(EndpointRegistry::new(urls).unwrap_err(), ConfigError::NoEndpoints);
        assert!(EndpointRegistry::new(["", " "]).is_err());
    }

    #[test]
    fn test_new_deduplicates_keeping_first_position() {
        let reg = EndpointRegistry::new([
            "https://api.example.hf.space",
            "https://api.example.hf.space/",
            "http://localhost:5001",
            "http://localhost:5000",
            "http://localhost:5001",
        ])
        .unwrap();

        let urls: Vec<&str> = reg.candidates().iter().map(|c| c.base_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://api.example.hf.space",
                "http://localhost:5001",
                "http://localhost:5000"
            ]
        );
    }

    #[test]
    fn test_current_endpoint_starts_at_primary() {
        let reg = registry(3);
        assert_eq!(reg.current_index(), 0);
        assert_eq!(reg.current_endpoint().base_url, "http://10.0.0.0:5000");
    }

    #[test]
    fn test_advance_wraps() {
        let mut reg = registry(3);
        assert_eq!(reg.advance().base_url, "http://10.0.0.1:5000");
        assert_eq!(reg.advance().base_url, "http://10.0.0.2:5000");
        assert_eq!(reg.advance().base_url, "http://10.0.0.0:5000");
        assert_eq!(reg.current_index(), 0);
    }

    #[test]
    fn test_has_cycled_from_middle() {
        let mut reg = registry(3);
        reg.restore(1);
        let start = reg.current_index();

        reg.advance();
        assert!(!reg.has_cycled(start));
        reg.advance();
        assert!(!reg.has_cycled(start));
        reg.advance();
        assert!(reg.has_cycled(start));
    }

    #[test]
    fn test_single_candidate_cycles_immediately() {
        let mut reg = registry(1);
        let start = reg.current_index();
        reg.advance();
        assert!(reg.has_cycled(start));
    }

    #[test]
    fn test_restore_out_of_range_is_ignored() {
        let mut reg = registry(2);
        assert!(reg.restore(1));
        assert!(!reg.restore(7));
        assert_eq!(reg.current_index(), 1);
    }

    #[test]
    fn test_clones_share_candidates_not_cursor() {
        let reg = registry(3);
        let mut copy = reg.clone();
        copy.advance();
        assert_eq!(reg.current_index(), 0);
        assert_eq!(copy.current_index(), 1);
        assert_eq!(reg.len(), copy.len());
    }
}
