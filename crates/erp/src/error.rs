/// Errors surfaced by the sync gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErpError {
    /// The ERP is disabled, misconfigured, or the connection attempt
    /// failed earlier in this process. Callers treat this as "skip".
    #[error("ERP not configured: {0}")]
    NotConfigured(String),

    /// The ERP kept rate-limiting us through every retry.
    #[error("ERP rate limit exceeded after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    /// The ERP answered with an error.
    #[error("ERP error: {0}")]
    Remote(String),

    /// The request never got a usable answer (network, HTTP status).
    #[error("ERP transport error: {0}")]
    Transport(String),

    /// The ERP answered with something we could not interpret.
    #[error("Unexpected ERP response: {0}")]
    Decode(String),
}

impl ErpError {
    /// Whether the error signals remote throttling (HTTP 429 or an
    /// equivalent message).
    pub fn is_rate_limit(&self) -> bool {
        let message = match self {
            ErpError::Remote(m) | ErpError::Transport(m) => m.to_lowercase(),
            _ => return false,
        };
        message.starts_with("http 429") || message.contains("too many") || message.contains("rate limit")
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, ErpError::NotConfigured(_))
    }
}

impl From<reqwest::Error> for ErpError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ErpError::Transport(format!("HTTP {status}")),
            None => ErpError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rate_limit_signals() {
        assert!(ErpError::Transport("HTTP 429 Too Many Requests".into()).is_rate_limit());
        assert!(ErpError::Remote("Too many requests, slow down".into()).is_rate_limit());
        assert!(ErpError::Remote("Rate limit reached".into()).is_rate_limit());
        assert!(!ErpError::Remote("Record does not exist".into()).is_rate_limit());
        assert!(!ErpError::NotConfigured("429".into()).is_rate_limit());
    }

    #[test]
    fn record_ids_containing_429_are_not_rate_limits() {
        assert!(!ErpError::Remote("record 4291 not found".into()).is_rate_limit());
        assert!(!ErpError::Transport("HTTP 500 Internal Server Error: job 429".into()).is_rate_limit());
        assert!(ErpError::Transport("HTTP 429 Too Many Requests".into()).is_rate_limit());
    }

    #[test]
    fn exhausted_message_names_attempts() {
        let err = ErpError::RateLimitExhausted { attempts: 3 };
        assert_eq!(err.to_string(), "ERP rate limit exceeded after 3 attempts");
    }
}
