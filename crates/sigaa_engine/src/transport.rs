use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE, USER_AGENT};
use reqwest::Method;
use url::Url;

use sigaa_core::SessionToken;

use crate::decode::decode_body;
use crate::signal::{classify, PageSignal};
use crate::{FetchedPage, PortalError};

/// Production portal base.
pub const PORTAL_BASE_URL: &str = "https://sigs.ufrpe.br";

pub(crate) const LOGIN_PATH: &str = "/sigaa/verTelaLogin.do";
pub(crate) const LANDING_PATH: &str = "/sigaa/portais/discente/discente.jsf";
pub(crate) const ATTENDANCE_PATH: &str = "/sigaa/ava/index.jsf";

// The portal rejects clients without a browser-looking user agent.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub base_url: Url,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(PORTAL_BASE_URL).expect("static portal base url"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The fixed portal endpoints, resolved once against the configured base.
#[derive(Debug, Clone)]
pub struct PortalUrls {
    base: Url,
    login: Url,
    landing: Url,
    attendance: Url,
}

impl PortalUrls {
    pub fn new(base: &Url) -> Result<Self, PortalError> {
        Ok(Self {
            login: join(base, LOGIN_PATH)?,
            landing: join(base, LANDING_PATH)?,
            attendance: join(base, ATTENDANCE_PATH)?,
            base: base.clone(),
        })
    }

    pub fn login(&self) -> Url {
        self.login.clone()
    }

    pub fn landing(&self) -> Url {
        self.landing.clone()
    }

    pub fn attendance(&self) -> Url {
        self.attendance.clone()
    }

    /// Resolve a form action path scraped out of a page.
    pub(crate) fn resolve(&self, path: &str) -> Result<Url, PortalError> {
        join(&self.base, path)
    }
}

fn join(base: &Url, path: &str) -> Result<Url, PortalError> {
    base.join(path)
        .map_err(|err| PortalError::InvalidUrl(format!("{path}: {err}")))
}

/// One portal round trip. Implementations send the request with the fixed
/// client headers and hand back the decoded page plus the session token to
/// use from here on.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        url: Url,
        session: &SessionToken,
        referer: Option<&Url>,
        form: Option<&[(String, String)]>,
    ) -> Result<FetchedPage, PortalError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(settings: &PortalSettings) -> Result<Self, PortalError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| PortalError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        method: Method,
        url: Url,
        session: &SessionToken,
        referer: Option<&Url>,
        form: Option<&[(String, String)]>,
    ) -> Result<FetchedPage, PortalError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(USER_AGENT, &self.user_agent);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer.as_str());
        }
        if !session.is_anonymous() {
            request = request.header(COOKIE, session.as_str());
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|err| PortalError::Transport(format!("{method} {url}: {err}")))?;

        let status = response.status();
        log::info!("{method} {url} -> {status}");

        // The portal rotates the cookie at will; the first Set-Cookie
        // directive wins, otherwise the caller's token carries over.
        let session = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| SessionToken::new(value.trim()))
            .unwrap_or_else(|| session.clone());

        if !status.is_success() {
            return Err(PortalError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| PortalError::Transport(format!("{method} {url}: {err}")))?;

        let html = decode_body(&bytes, content_type.as_deref())
            .map_err(|err| PortalError::parse(url.to_string(), err.to_string()))?;

        match classify(&html) {
            PageSignal::InvalidCredentials => Err(PortalError::InvalidCredentials),
            PageSignal::SessionExpired => Err(PortalError::SessionExpired),
            PageSignal::Ok => Ok(FetchedPage {
                html,
                session,
                final_url,
            }),
        }
    }
}
