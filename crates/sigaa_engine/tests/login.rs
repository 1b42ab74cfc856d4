use std::sync::{Arc, Once};

use sigaa_core::SessionToken;
use sigaa_engine::{PortalClient, PortalError, PortalSettings, PortalUrls, ReqwestTransport};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"
<html><body>
  <form name="loginForm" method="post" action="/sigaa/logar.do;jsessionid=70AAFF3210.inst1?dispatch=logOn">
    <input type="text" name="user.login" />
    <input type="password" name="user.senha" />
  </form>
</body></html>"#;

const PORTAL_PAGE: &str = r#"
<html><body>
  <p class="usuario"><span>FULANO DE TAL</span></p>
  <input type="hidden" name="javax.faces.ViewState" value="j_id_portal" />
</body></html>"#;

const NOTICE_PAGE: &str = r#"
<html><body>
  <form id="j_id_jsp_933481798_1" name="j_id_jsp_933481798_1" action="/sigaa/telaAvisoLogon.jsf">
    <input type="hidden" name="j_id_jsp_933481798_1" value="j_id_jsp_933481798_1" />
    <p>Comunicado sobre o período de matrícula.</p>
    <input type="submit" name="j_id_jsp_933481798_1:j_id_jsp_933481798_4" value="Continuar >>" />
    <input type="hidden" name="javax.faces.ViewState" value="j_id7" />
  </form>
</body></html>"#;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn client_for(server: &MockServer) -> PortalClient {
    let base = Url::parse(&server.uri()).unwrap();
    let settings = PortalSettings {
        base_url: base.clone(),
        ..PortalSettings::default()
    };
    PortalClient::with_transport(
        Arc::new(ReqwestTransport::new(&settings).unwrap()),
        PortalUrls::new(&base).unwrap(),
    )
}

async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sigaa/verTelaLogin.do"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=LOGIN1; Path=/sigaa")
                .set_body_raw(LOGIN_PAGE, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_posts_credentials_to_the_cleaned_action_url() {
    init_logging();
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    // The mock only matches the action path with the stale ;jsessionid
    // suffix stripped; an unstripped POST would miss and fail the test.
    Mock::given(method("POST"))
        .and(path("/sigaa/logar.do"))
        .and(query_param("dispatch", "logOn"))
        .and(header("Cookie", "JSESSIONID=LOGIN1"))
        .and(body_string_contains("user.login=aluno"))
        .and(body_string_contains("user.senha=segredo"))
        .and(body_string_contains("width=1920"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=AUTH99; Path=/sigaa")
                .set_body_raw(PORTAL_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = client.login("aluno", "segredo").await.expect("login ok");
    assert_eq!(session, SessionToken::new("JSESSIONID=AUTH99"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn wrong_credentials_fail_in_a_single_attempt() {
    init_logging();
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/sigaa/logar.do"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><div class=\"erros\">Usuário e/ou senha inválidos</div></body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.login("aluno", "errada").await.unwrap_err();
    assert_eq!(err, PortalError::InvalidCredentials);

    // One GET plus one POST: credential rejections are never retried.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn transient_failures_rerun_the_whole_handshake() {
    init_logging();
    let server = MockServer::start().await;

    // First two attempts die on the login page fetch, the third goes through.
    Mock::given(method("GET"))
        .and(path("/sigaa/verTelaLogin.do"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/sigaa/logar.do"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=AUTH3; Path=/sigaa")
                .set_body_raw(PORTAL_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = client.login("aluno", "segredo").await.expect("login ok");
    assert_eq!(session, SessionToken::new("JSESSIONID=AUTH3"));

    // 2 failed GETs, then GET + POST.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn persistent_failures_surface_after_six_attempts() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sigaa/verTelaLogin.do"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.login("aluno", "segredo").await.unwrap_err();
    assert!(matches!(
        err,
        PortalError::UnexpectedStatus { status: 502, .. }
    ));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn consent_notice_is_clicked_through() {
    init_logging();
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/sigaa/logar.do"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=MEIO5; Path=/sigaa")
                .set_body_raw(NOTICE_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sigaa/telaAvisoLogon.jsf"))
        .and(header("Cookie", "JSESSIONID=MEIO5"))
        .and(body_string_contains("Continuar"))
        .and(body_string_contains("javax.faces.ViewState=j_id7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=FINAL7; Path=/sigaa")
                .set_body_raw(PORTAL_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = client.login("aluno", "segredo").await.expect("login ok");
    assert_eq!(session, SessionToken::new("JSESSIONID=FINAL7"));
}
