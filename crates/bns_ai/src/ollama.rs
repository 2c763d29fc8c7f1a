use std::io;
use std::time::Duration;

use bns_core::error::AppError;
use serde::Deserialize;

const LOCAL_HOSTS: &[&str] = &["127.0.0.1", "localhost"];

/// Per-call time limits. Ollama can hang on a cold model load, so every call
/// carries an explicit deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OllamaTimeouts {
    pub connect: Duration,
    pub health: Duration,
    pub embed: Duration,
    pub generation: Duration,
}

impl Default for OllamaTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(800),
            health: Duration::from_millis(800),
            embed: Duration::from_secs(10),
            generation: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    agent: ureq::Agent,
    timeouts: OllamaTimeouts,
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaClient {
    /// Create a client for Ollama. This is strictly limited to the local machine.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Self::with_timeouts(base_url, OllamaTimeouts::default())
    }

    pub fn with_timeouts(base_url: &str, timeouts: OllamaTimeouts) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        validate_local_base_url(&base_url)?;

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeouts.connect)
            .build();
        Ok(Self {
            base_url,
            agent,
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeouts(&self) -> OllamaTimeouts {
        self.timeouts
    }

    pub(crate) fn post(&self, path: &str, timeout: Duration) -> ureq::Request {
        self.agent
            .post(&format!("{}{}", self.base_url, path))
            .timeout(timeout)
    }

    /// Names of the models pulled into the local Ollama instance.
    pub fn list_models(&self) -> Result<Vec<String>, AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.agent.get(&url).timeout(self.timeouts.health).call();

        match resp {
            Ok(r) => {
                let tags: TagsResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_BACKEND_UNREACHABLE", "Ollama returned an unreadable model list")
                        .with_details(e.to_string())
                })?;
                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
            Err(e) => Err(classify_call_error(e, "AI_BACKEND_UNREACHABLE", "health check")),
        }
    }
}

/// Accept only `http://127.0.0.1[:port]` or `http://localhost[:port]`.
fn validate_local_base_url(base_url: &str) -> Result<(), AppError> {
    let reject = || {
        AppError::new(
            "AI_REMOTE_NOT_ALLOWED",
            "Ollama base URL must point at the local machine (127.0.0.1 or localhost)",
        )
        .with_details(format!("base_url={base_url}"))
    };

    let rest = base_url.strip_prefix("http://").ok_or_else(reject)?;
    let (host, port) = match rest.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (rest, None),
    };
    if !LOCAL_HOSTS.contains(&host) {
        return Err(reject());
    }
    if let Some(port) = port {
        match port.parse::<u16>() {
            Ok(p) if p != 0 => {}
            _ => return Err(reject()),
        }
    }
    Ok(())
}

/// Map a failed `ureq` call onto the error taxonomy. Timeouts get the
/// caller's timeout code, everything else is an unreachable/erroring backend.
pub(crate) fn classify_call_error(err: ureq::Error, timeout_code: &str, what: &str) -> AppError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            AppError::new("AI_BACKEND_UNREACHABLE", format!("Ollama {what} request failed"))
                .with_details(format!("status={status}; body={}", body.trim()))
                .with_retryable(true)
        }
        ureq::Error::Transport(t) => {
            if is_timeout(&t) {
                AppError::new(timeout_code, format!("Ollama {what} timed out"))
                    .with_details(t.to_string())
                    .with_retryable(true)
            } else {
                AppError::new("AI_BACKEND_UNREACHABLE", format!("Failed to reach Ollama for {what}"))
                    .with_details(t.to_string())
                    .with_retryable(true)
            }
        }
    }
}

/// Same mapping for errors raised while reading a response body.
pub(crate) fn classify_io_error(err: &io::Error, timeout_code: &str, what: &str) -> AppError {
    if is_timeout_kind(err.kind()) {
        AppError::new(timeout_code, format!("Ollama {what} timed out"))
            .with_details(err.to_string())
            .with_retryable(true)
    } else {
        AppError::new("AI_BACKEND_UNREACHABLE", format!("Ollama {what} stream broke"))
            .with_details(err.to_string())
            .with_retryable(true)
    }
}

fn is_timeout(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cur: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cur {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if is_timeout_kind(io_err.kind()) {
                return true;
            }
        }
        cur = e.source();
    }
    false
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeouts_map_to_caller_timeout_code() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "timed out reading response");
        let app = classify_io_error(&err, "AI_GENERATION_TIMEOUT", "chat");
        assert_eq!(app.code, "AI_GENERATION_TIMEOUT");
        assert!(app.retryable);

        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let app = classify_io_error(&err, "AI_GENERATION_TIMEOUT", "chat");
        assert_eq!(app.code, "AI_BACKEND_UNREACHABLE");
    }

    #[test]
    fn nested_io_timeout_is_detected() {
        #[derive(Debug)]
        struct Wrapper(io::Error);
        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "wrapped")
            }
        }
        impl std::error::Error for Wrapper {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let w = Wrapper(io::Error::new(io::ErrorKind::TimedOut, "connect"));
        assert!(is_timeout(&w));
        let w = Wrapper(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(!is_timeout(&w));
    }
}
