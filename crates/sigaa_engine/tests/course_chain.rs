use std::sync::{Arc, Once};

use pretty_assertions::assert_eq;
use sigaa_core::{AbsenceCount, CourseSummary, NavigationHandle, SessionToken, ViewState};
use sigaa_engine::{PortalClient, PortalError, PortalSettings, PortalUrls, ReqwestTransport};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COURSE_PAGE: &str = r#"
<html><body>
  <div id="ultimaNoticia">
    <h4><img src="icone.png"> Prova remarcada</h4>
    <div class="conteudoNoticia"><p>A prova foi adiada.</p></div>
  </div>
  <div id="formAva:panelTopicosNaoSelecionados">
    <span><div>
      <div>Unidade 1</div>
      <div><p>Modelo relacional.</p></div>
    </div></span>
  </div>
  <input type="hidden" name="javax.faces.ViewState" value="VS1" />
</body></html>"#;

const ATTENDANCE_PAGE: &str = r#"
<html><body>
  <table><tr><td>3 Falta(s)</td></tr><tr><td>2 Falta(s)</td></tr></table>
  <input type="hidden" name="javax.faces.ViewState" value="VS2" />
</body></html>"#;

const ATTENDANCE_PENDING_PAGE: &str = r#"
<html><body>
  <p>A frequência ainda não foi lançada.</p>
  <input type="hidden" name="javax.faces.ViewState" value="VS2" />
</body></html>"#;

const RETURN_PAGE: &str = r#"
<html><body>
  <p class="usuario"><span>FULANO</span></p>
  <input type="hidden" name="javax.faces.ViewState" value="VS3" />
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

fn course() -> CourseSummary {
    CourseSummary {
        name: "BANCO DE DADOS".to_string(),
        handle: NavigationHandle {
            front_end_id: "81057".to_string(),
            form_name: "form_acessarTurmaVirtual1".to_string(),
            component_id: "form_acessarTurmaVirtual1:j_id_1".to_string(),
        },
        ..CourseSummary::default()
    }
}

async fn mount_course_entry(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sigaa/portais/discente/discente.jsf"))
        .and(body_string_contains("frontEndIdTurma=81057"))
        .and(body_string_contains("javax.faces.ViewState=VS0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=S1; Path=/sigaa")
                .set_body_raw(COURSE_PAGE, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_attendance(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/sigaa/ava/index.jsf"))
        .and(body_string_contains("formMenu=formMenu"))
        .and(body_string_contains("javax.faces.ViewState=VS1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=S2; Path=/sigaa")
                .set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_return(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sigaa/portais/discente/discente.jsf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=S3; Path=/sigaa")
                .set_body_raw(RETURN_PAGE, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_chain_updates_course_and_continuation_pair() {
    init_logging();
    let server = MockServer::start().await;
    mount_course_entry(&server).await;
    mount_attendance(&server, ATTENDANCE_PAGE).await;
    mount_return(&server).await;

    let client = client_for(&server);
    let detail = client
        .fetch_course_detail(
            course(),
            SessionToken::new("JSESSIONID=S0"),
            ViewState::new("VS0"),
        )
        .await
        .expect("chain ok");

    let news = detail.course.news.expect("news extracted");
    assert_eq!(news.title, "Prova remarcada");
    assert_eq!(news.paragraphs, vec!["A prova foi adiada."]);
    assert_eq!(detail.course.syllabus.len(), 1);
    assert_eq!(detail.course.syllabus[0].title, "Unidade 1");
    assert_eq!(detail.course.syllabus[0].content, "Modelo relacional.");
    assert_eq!(detail.course.absences, AbsenceCount::Total(5));

    // The chain ends back on the landing page, whose render is current.
    assert_eq!(detail.session, SessionToken::new("JSESSIONID=S3"));
    assert_eq!(detail.view_state.as_str(), "VS3");
}

#[tokio::test]
async fn unpublished_attendance_yields_the_sentinel() {
    init_logging();
    let server = MockServer::start().await;
    mount_course_entry(&server).await;
    mount_attendance(&server, ATTENDANCE_PENDING_PAGE).await;
    mount_return(&server).await;

    let client = client_for(&server);
    let detail = client
        .fetch_course_detail(
            course(),
            SessionToken::new("JSESSIONID=S0"),
            ViewState::new("VS0"),
        )
        .await
        .expect("chain ok");
    assert_eq!(detail.course.absences, AbsenceCount::NotYetPublished);
}

#[tokio::test]
async fn entry_failure_keeps_the_callers_pair() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sigaa/portais/discente/discente.jsf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let abort = client
        .fetch_course_detail(
            course(),
            SessionToken::new("JSESSIONID=S0"),
            ViewState::new("VS0"),
        )
        .await
        .unwrap_err();

    assert_eq!(abort.session, SessionToken::new("JSESSIONID=S0"));
    assert_eq!(abort.view_state.as_str(), "VS0");
    assert!(matches!(
        abort.source,
        PortalError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn attendance_failure_keeps_exactly_the_first_steps_pair() {
    init_logging();
    let server = MockServer::start().await;
    mount_course_entry(&server).await;
    Mock::given(method("POST"))
        .and(path("/sigaa/ava/index.jsf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_return(&server).await;

    let client = client_for(&server);
    let abort = client
        .fetch_course_detail(
            course(),
            SessionToken::new("JSESSIONID=S0"),
            ViewState::new("VS0"),
        )
        .await
        .unwrap_err();

    // Step 1's output, not the caller's input and not step 3's render.
    assert_eq!(abort.session, SessionToken::new("JSESSIONID=S1"));
    assert_eq!(abort.view_state.as_str(), "VS1");
}

#[tokio::test]
async fn return_failure_keeps_the_attendance_pair_and_is_labeled() {
    init_logging();
    let server = MockServer::start().await;
    mount_course_entry(&server).await;
    mount_attendance(&server, ATTENDANCE_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/sigaa/portais/discente/discente.jsf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let abort = client
        .fetch_course_detail(
            course(),
            SessionToken::new("JSESSIONID=S0"),
            ViewState::new("VS0"),
        )
        .await
        .unwrap_err();

    assert_eq!(abort.session, SessionToken::new("JSESSIONID=S2"));
    assert_eq!(abort.view_state.as_str(), "VS2");
    assert!(matches!(abort.source, PortalError::ReturnFailed(_)));
}
