//! Remote service access
//!
//! Suggestion providers only need "GET this URL, give me the body". The
//! [`Fetcher`] trait keeps that seam open for hosts and tests; [`UreqFetcher`]
//! is the blocking implementation.

use std::time::Duration;

use crate::config::Settings;
use crate::error::{Error, Result};

pub trait Fetcher {
    /// GET `url` with the given `Accept` header and return the body text.
    fn fetch(&self, url: &str, accept: &str) -> Result<String>;
}

/// Blocking HTTP client (ureq)
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(timeout_secs)))
                .user_agent(user_agent)
                .build(),
        );
        Self { agent }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.user_agent, settings.timeout_secs)
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str, accept: &str) -> Result<String> {
        let resp = match self.agent.get(url).header("Accept", accept).call() {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(status)) => {
                return Err(Error::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(e) => {
                return Err(Error::Http {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };

        if !resp.status().is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.into_body().read_to_string().map_err(|e| Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned responses keyed by URL; unknown URLs fail like a dead host.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        responses: HashMap<String, String>,
        pub(crate) requested: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub(crate) fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl Fetcher for StubFetcher {
        fn fetch(&self, url: &str, _accept: &str) -> Result<String> {
            self.requested.borrow_mut().push(url.to_string());
            self.responses.get(url).cloned().ok_or_else(|| Error::Http {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    #[test]
    fn test_stub_fetcher() {
        let fetcher = StubFetcher::default().with("https://example.org/a", "{}");
        assert_eq!(fetcher.fetch("https://example.org/a", "application/json").unwrap(), "{}");
        let err = fetcher.fetch("https://example.org/b", "application/json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.org/b: connection refused"
        );
        assert_eq!(fetcher.requested.borrow().len(), 2);
    }
}
