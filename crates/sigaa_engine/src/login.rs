use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use scraper::{Html, Selector};

use sigaa_core::{SessionToken, ViewState};

use crate::transport::{PortalUrls, Transport};
use crate::viewstate::{parse_view_state, VIEW_STATE_FIELD};
use crate::PortalError;

/// Extra attempts after the first failed handshake. The sixth failure is
/// surfaced to the caller as-is.
const MAX_LOGIN_RETRIES: usize = 5;

const CONTINUE_BUTTON_LABEL: &str = "Continuar >>";

// Render-time session path suffix on form action URLs. It is stale by submit
// time and must not be reused.
static STALE_SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";jsessionid=[^?]+").unwrap());

pub(crate) fn strip_stale_session(path: &str) -> String {
    STALE_SESSION_RE.replace_all(path, "").into_owned()
}

/// Run the full login handshake, yielding a fresh session token.
///
/// Credential rejections are final. Anything else re-runs the whole
/// handshake from the top with a fresh anonymous session, up to
/// [`MAX_LOGIN_RETRIES`] extra times.
pub(crate) async fn login(
    transport: &dyn Transport,
    urls: &PortalUrls,
    username: &str,
    password: &str,
) -> Result<SessionToken, PortalError> {
    let mut attempt = 0;
    loop {
        match login_once(transport, urls, username, password).await {
            Ok(session) => return Ok(session),
            Err(PortalError::InvalidCredentials) => return Err(PortalError::InvalidCredentials),
            Err(err) if attempt < MAX_LOGIN_RETRIES => {
                attempt += 1;
                log::warn!("login attempt {attempt} failed, retrying: {err}");
            }
            Err(err) => return Err(err),
        }
    }
}

async fn login_once(
    transport: &dyn Transport,
    urls: &PortalUrls,
    username: &str,
    password: &str,
) -> Result<SessionToken, PortalError> {
    let login_url = urls.login();
    let page = transport
        .execute(
            Method::GET,
            login_url.clone(),
            &SessionToken::anonymous(),
            None,
            None,
        )
        .await?;
    let session = page.session.clone();

    let action = {
        let doc = page.document();
        let form_sel = Selector::parse("form[name='loginForm']").unwrap();
        doc.select(&form_sel)
            .next()
            .and_then(|form| form.value().attr("action"))
            .map(str::to_string)
    }
    .ok_or_else(|| PortalError::parse("login page", "loginForm action not found"))?;
    let action_url = urls.resolve(&strip_stale_session(&action))?;

    let credentials_form = vec![
        ("user.login".to_string(), username.to_string()),
        ("user.senha".to_string(), password.to_string()),
        ("width".to_string(), "1920".to_string()),
        ("height".to_string(), "1080".to_string()),
        ("urlRedirect".to_string(), String::new()),
        ("subsistemaRedirect".to_string(), String::new()),
        ("acao".to_string(), String::new()),
        ("acessibilidade".to_string(), String::new()),
    ];
    let page = transport
        .execute(
            Method::POST,
            action_url,
            &session,
            Some(&login_url),
            Some(&credentials_form),
        )
        .await?;
    let session = page.session.clone();

    let interstitial = {
        let doc = page.document();
        parse_interstitial(&doc)?
    };
    let Some(consent) = interstitial else {
        return Ok(session);
    };

    // First login of the term shows a notice page; a simulated click on its
    // submit control lands on the authenticated portal.
    log::info!("consent notice detected, simulating the continue click");
    let action_url = urls.resolve(&strip_stale_session(&consent.action))?;
    let consent_form = vec![
        (consent.form_name, consent.form_value),
        (consent.button_name, CONTINUE_BUTTON_LABEL.to_string()),
        (
            VIEW_STATE_FIELD.to_string(),
            consent.view_state.as_str().to_string(),
        ),
    ];
    let page = transport
        .execute(
            Method::POST,
            action_url,
            &session,
            Some(&page.final_url),
            Some(&consent_form),
        )
        .await?;
    Ok(page.session)
}

#[derive(Debug)]
struct InterstitialForm {
    action: String,
    form_name: String,
    form_value: String,
    button_name: String,
    view_state: ViewState,
}

/// Detect the consent notice page and gather the fields its postback needs.
///
/// Returns `Ok(None)` when the page is not the notice. Once the notice's
/// submit control is present, every other piece is required.
fn parse_interstitial(doc: &Html) -> Result<Option<InterstitialForm>, PortalError> {
    let button_sel = Selector::parse("input[type='submit'][value*='Continuar']").unwrap();
    if doc.select(&button_sel).next().is_none() {
        return Ok(None);
    }

    let form_sel = Selector::parse("form").unwrap();
    let hidden_sel = Selector::parse("input[type='hidden']").unwrap();

    let form = doc
        .select(&form_sel)
        .next()
        .ok_or_else(|| PortalError::parse("consent notice", "no form on page"))?;
    let action = form
        .value()
        .attr("action")
        .ok_or_else(|| PortalError::parse("consent notice", "form action not found"))?
        .to_string();
    let button_name = form
        .select(&button_sel)
        .next()
        .and_then(|button| button.value().attr("name"))
        .ok_or_else(|| PortalError::parse("consent notice", "continue button has no name"))?
        .to_string();

    // JSF expects the form to post a hidden field named after itself.
    let form_name = form.value().attr("name").unwrap_or("").to_string();
    let form_value = form
        .select(&hidden_sel)
        .find(|input| input.value().attr("name") == Some(form_name.as_str()))
        .and_then(|input| input.value().attr("value"))
        .unwrap_or("")
        .to_string();

    let view_state = parse_view_state(doc, "consent notice")?;

    Ok(Some(InterstitialForm {
        action,
        form_name,
        form_value,
        button_name,
        view_state,
    }))
}
