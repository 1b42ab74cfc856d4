use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use scraper::{Html, Selector};

use sigaa_core::{AbsenceCount, CourseSummary, NewsItem, SessionToken, SyllabusItem, ViewState};

use crate::text::{child_elements, element_text, text_node_parts, trailing_text};
use crate::transport::{PortalUrls, Transport};
use crate::viewstate::{parse_view_state, VIEW_STATE_FIELD};
use crate::{ChainAbort, CourseDetail, PortalError};

const ATTENDANCE_NOT_PUBLISHED_MARKER: &str = "A frequência ainda não foi lançada.";

static ABSENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+Falta\(s\)").unwrap());

/// Drive the three-step course detail chain: enter the course page, enter
/// the attendance page, then return to the landing page so the next call
/// finds the session where it expects it.
///
/// Each step consumes the view state the previous one produced. On failure
/// the chain stops and hands back the last continuation pair that is still
/// good, so the caller keeps the forward progress already made.
pub(crate) async fn fetch_course_detail(
    transport: &dyn Transport,
    urls: &PortalUrls,
    mut course: CourseSummary,
    session: SessionToken,
    view_state: ViewState,
) -> Result<CourseDetail, ChainAbort> {
    let landing = urls.landing();

    // Step 1: post into the course's virtual classroom.
    let entry_form = vec![
        (
            course.handle.form_name.clone(),
            course.handle.form_name.clone(),
        ),
        (
            course.handle.component_id.clone(),
            course.handle.component_id.clone(),
        ),
        (
            VIEW_STATE_FIELD.to_string(),
            view_state.as_str().to_string(),
        ),
        ("frontEndIdTurma".to_string(), course.handle.front_end_id.clone()),
    ];
    let page = match transport
        .execute(
            Method::POST,
            landing.clone(),
            &session,
            Some(&landing),
            Some(&entry_form),
        )
        .await
    {
        Ok(page) => page,
        Err(source) => {
            return Err(ChainAbort {
                source,
                session,
                view_state,
            })
        }
    };
    let session_1 = page.session.clone();
    let (news, syllabus, view_state_1) = {
        let doc = page.document();
        (
            extract_news(&doc),
            extract_syllabus(&doc),
            parse_view_state(&doc, &format!("course page for {}", course.name)),
        )
    };
    course.news = news;
    course.syllabus = syllabus;
    let view_state_1 = match view_state_1 {
        Ok(view_state_1) => view_state_1,
        Err(source) => {
            return Err(ChainAbort {
                source,
                session,
                view_state,
            })
        }
    };

    // Step 2: post into the attendance report.
    let attendance_form = vec![
        ("formMenu".to_string(), "formMenu".to_string()),
        (
            "formMenu:j_id_jsp_1879301362_71".to_string(),
            "formMenu:j_id_jsp_1879301362_94".to_string(),
        ),
        (
            VIEW_STATE_FIELD.to_string(),
            view_state_1.as_str().to_string(),
        ),
        (
            "formMenu:j_id_jsp_1879301362_97".to_string(),
            "formMenu:j_id_jsp_1879301362_97".to_string(),
        ),
    ];
    let page = match transport
        .execute(
            Method::POST,
            urls.attendance(),
            &session_1,
            Some(&landing),
            Some(&attendance_form),
        )
        .await
    {
        Ok(page) => page,
        Err(source) => {
            return Err(ChainAbort {
                source,
                session: session_1,
                view_state: view_state_1,
            })
        }
    };
    let session_2 = page.session.clone();
    course.absences = if page.html.contains(ATTENDANCE_NOT_PUBLISHED_MARKER) {
        AbsenceCount::NotYetPublished
    } else {
        AbsenceCount::Total(sum_absences(&page.html))
    };
    let view_state_2 = {
        let doc = page.document();
        parse_view_state(&doc, &format!("attendance page for {}", course.name))
    };
    let view_state_2 = match view_state_2 {
        Ok(view_state_2) => view_state_2,
        Err(source) => {
            return Err(ChainAbort {
                source,
                session: session_1,
                view_state: view_state_1,
            })
        }
    };

    // Step 3: back to the landing page, which renders the view state the
    // next call will need.
    let page = match transport
        .execute(Method::GET, landing, &session_2, None, None)
        .await
    {
        Ok(page) => page,
        Err(source) => {
            return Err(ChainAbort {
                source: PortalError::ReturnFailed(Box::new(source)),
                session: session_2,
                view_state: view_state_2,
            })
        }
    };
    let session_3 = page.session.clone();
    let view_state_3 = {
        let doc = page.document();
        parse_view_state(&doc, "portal landing page")
    };
    let view_state_3 = match view_state_3 {
        Ok(view_state_3) => view_state_3,
        Err(source) => {
            return Err(ChainAbort {
                source: PortalError::ReturnFailed(Box::new(source)),
                session: session_2,
                view_state: view_state_2,
            })
        }
    };

    Ok(CourseDetail {
        course,
        session: session_3,
        view_state: view_state_3,
    })
}

/// Sum every "N Falta(s)" occurrence on the attendance report.
pub(crate) fn sum_absences(html: &str) -> u32 {
    ABSENCE_RE
        .captures_iter(html)
        .filter_map(|captures| captures[1].parse::<u32>().ok())
        .sum()
}

/// Latest class news post, if the course page carries one.
fn extract_news(doc: &Html) -> Option<NewsItem> {
    let news_sel = Selector::parse("#ultimaNoticia").unwrap();
    let title_sel = Selector::parse("h4").unwrap();
    let paragraph_sel = Selector::parse(".conteudoNoticia p").unwrap();

    let block = doc.select(&news_sel).next()?;
    // The h4 leads with an icon; the post title is its trailing text.
    let title = block
        .select(&title_sel)
        .next()
        .map(trailing_text)
        .unwrap_or_default();
    let paragraphs = block.select(&paragraph_sel).map(element_text).collect();
    Some(NewsItem { title, paragraphs })
}

/// Syllabus topics from the course page's topic panel.
///
/// Each span wraps one topic: a div whose first child element is the title
/// and whose second, when present, holds the description, either in a nested
/// paragraph or as loose text nodes.
fn extract_syllabus(doc: &Html) -> Vec<SyllabusItem> {
    let panel_sel = Selector::parse(r"#formAva\:panelTopicosNaoSelecionados").unwrap();
    let span_sel = Selector::parse("span").unwrap();
    let p_sel = Selector::parse("p").unwrap();

    let Some(panel) = doc.select(&panel_sel).next() else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for span in panel.select(&span_sel) {
        let Some(entry) = child_elements(span).next() else {
            continue;
        };
        let mut parts = child_elements(entry);
        let title = parts.next().map(element_text).unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        let content = match parts.next() {
            None => String::new(),
            Some(body) => match body.select(&p_sel).next() {
                Some(paragraph) => element_text(paragraph),
                None => text_node_parts(body).join(" "),
            },
        };
        items.push(SyllabusItem { title, content });
    }
    items
}
