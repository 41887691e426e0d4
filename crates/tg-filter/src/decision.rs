use std::fmt;

/// Terminal state of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// The workload did not ask for verification; no network calls were made.
    NotRequired,
    Trusted,
    TagsMatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    HostNotFound,
    FetchFailed,
    Untrusted,
    TagMismatch,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow(AllowReason::NotRequired) => write!(f, "allow (verification not requested)"),
            Self::Allow(AllowReason::Trusted) => write!(f, "allow (host trusted)"),
            Self::Allow(AllowReason::TagsMatched) => write!(f, "allow (host trusted, tags matched)"),
            Self::Deny(DenyReason::HostNotFound) => write!(f, "deny (host not in directory)"),
            Self::Deny(DenyReason::FetchFailed) => write!(f, "deny (assertion unavailable)"),
            Self::Deny(DenyReason::Untrusted) => write!(f, "deny (host untrusted)"),
            Self::Deny(DenyReason::TagMismatch) => write!(f, "deny (asset tags do not match)"),
        }
    }
}
