use std::sync::Arc;

use sigaa_core::{CourseSummary, SessionToken, ViewState};

use crate::transport::{PortalSettings, PortalUrls, ReqwestTransport, Transport};
use crate::{course, grades, landing, login};
use crate::{ChainAbort, CourseDetail, GradesReport, LandingData, PortalError};

/// Stateless façade over the protocol flows.
///
/// Holds only the transport and the resolved endpoint set. Credentials and
/// continuation state are always parameters in, refreshed values out, so one
/// client can serve any number of unrelated sessions; the caller serializes
/// calls that share a `(session, view state)` pair.
pub struct PortalClient {
    transport: Arc<dyn Transport>,
    urls: PortalUrls,
}

impl PortalClient {
    pub fn new(settings: PortalSettings) -> Result<Self, PortalError> {
        let urls = PortalUrls::new(&settings.base_url)?;
        let transport = Arc::new(ReqwestTransport::new(&settings)?);
        Ok(Self { transport, urls })
    }

    /// Build a client over a custom transport, for tests and doubles.
    pub fn with_transport(transport: Arc<dyn Transport>, urls: PortalUrls) -> Self {
        Self { transport, urls }
    }

    /// Run the login handshake and yield the fresh session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, PortalError> {
        login::login(self.transport.as_ref(), &self.urls, username, password).await
    }

    /// Fetch the landing page: profile, courses, assessments, plus the
    /// continuation pair for the next call.
    pub async fn fetch_landing(&self, session: &SessionToken) -> Result<LandingData, PortalError> {
        landing::fetch_landing(self.transport.as_ref(), &self.urls, session).await
    }

    /// Run the three-step course detail chain for one course.
    pub async fn fetch_course_detail(
        &self,
        course: CourseSummary,
        session: SessionToken,
        view_state: ViewState,
    ) -> Result<CourseDetail, ChainAbort> {
        course::fetch_course_detail(
            self.transport.as_ref(),
            &self.urls,
            course,
            session,
            view_state,
        )
        .await
    }

    /// Generate and extract the grade report.
    pub async fn fetch_grades(
        &self,
        session: SessionToken,
        view_state: ViewState,
    ) -> Result<GradesReport, PortalError> {
        grades::fetch_grades(self.transport.as_ref(), &self.urls, session, view_state).await
    }
}
