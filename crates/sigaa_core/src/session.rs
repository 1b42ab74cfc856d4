use serde::{Deserialize, Serialize};

/// Opaque cookie value identifying the caller's session on the remote portal.
///
/// The portal may rotate the value on any response; the engine always echoes
/// the most recently observed value forward. An empty token means the request
/// is anonymous (only valid for the first step of the login flow).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The empty token used before any session has been established.
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// JSF server-side continuation token required on every postback.
///
/// Each page render produces exactly one current value; a postback must carry
/// the value from the immediately preceding render or the portal rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewState(String);

impl ViewState {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ViewState {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
