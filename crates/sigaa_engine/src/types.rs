use serde::{Deserialize, Serialize};
use sigaa_core::{Assessment, CourseSummary, GradeRecord, SessionToken, StudentProfile, ViewState};
use url::Url;

/// A fetched portal page: decoded markup text, the session token to carry
/// into the next request, and the URL the response actually came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: String,
    pub session: SessionToken,
    pub final_url: Url,
}

impl FetchedPage {
    /// Parse the page into a traversable markup tree.
    ///
    /// The parsed tree is not `Send`; callers parse inside a scoped block and
    /// drop the tree before the next await point.
    pub fn document(&self) -> scraper::Html {
        scraper::Html::parse_document(&self.html)
    }
}

/// Everything extracted from the authenticated landing page, plus the
/// continuation pair the caller must supply on its next call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingData {
    pub profile: StudentProfile,
    pub assessments: Vec<Assessment>,
    pub courses: Vec<CourseSummary>,
    pub session: SessionToken,
    pub view_state: ViewState,
}

/// Result of the three-step course detail chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub course: CourseSummary,
    pub session: SessionToken,
    pub view_state: ViewState,
}

/// Result of the grade report flow. The view state is the caller's own,
/// unchanged: the report page needs no navigation past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradesReport {
    pub grades: Vec<GradeRecord>,
    pub session: SessionToken,
    pub view_state: ViewState,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortalError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("invalid portal url: {0}")]
    InvalidUrl(String),
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("portal session invalid or expired")]
    SessionExpired,
    #[error("student profile not found, authentication required")]
    AuthRequired,
    #[error("could not return to the portal landing page")]
    ReturnFailed(#[source] Box<PortalError>),
}

impl PortalError {
    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// True for failures the caller should map to an authorization-denied
    /// response instead of a generic communication failure.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }

    /// True when the caller must re-authenticate before trying again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthRequired)
    }
}

/// A later step of the course detail chain failed. Carries the last
/// known-good continuation pair so the caller keeps the forward progress the
/// earlier steps already made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("course detail chain aborted: {source}")]
pub struct ChainAbort {
    #[source]
    pub source: PortalError,
    pub session: SessionToken,
    pub view_state: ViewState,
}
