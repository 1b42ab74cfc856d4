use reqwest::Method;
use scraper::{ElementRef, Html, Selector};

use sigaa_core::{
    AcademicIndices, Assessment, CourseSummary, NavigationHandle, SessionToken, StudentProfile,
    WorkloadSummary,
};

use crate::handle::{parse_component_id, parse_front_end_id};
use crate::text::element_text;
use crate::transport::{PortalUrls, Transport};
use crate::viewstate::parse_view_state;
use crate::{LandingData, PortalError};

/// Fetch the authenticated landing page and extract everything on it.
///
/// A missing student name means the session no longer maps to a logged-in
/// user; the caller treats `AuthRequired` as "log in again".
pub(crate) async fn fetch_landing(
    transport: &dyn Transport,
    urls: &PortalUrls,
    session: &SessionToken,
) -> Result<LandingData, PortalError> {
    let page = transport
        .execute(Method::GET, urls.landing(), session, None, None)
        .await?;
    let session = page.session.clone();

    let doc = page.document();
    let view_state = parse_view_state(&doc, "landing page")?;
    let name = extract_student_name(&doc).ok_or(PortalError::AuthRequired)?;
    let courses = extract_courses(&doc)?;
    let assessments = extract_assessments(&doc);
    let profile = StudentProfile {
        name,
        indices: extract_indices(&doc),
        workload: extract_workload(&doc),
    };

    Ok(LandingData {
        profile,
        assessments,
        courses,
        session,
        view_state,
    })
}

fn extract_student_name(doc: &Html) -> Option<String> {
    let primary = Selector::parse("p.usuario span").unwrap();
    let fallback = Selector::parse(".usuario > span").unwrap();
    doc.select(&primary)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            doc.select(&fallback)
                .next()
                .map(element_text)
                .filter(|name| !name.is_empty())
        })
}

/// One course per entry form, identifiers pulled out of the link's onclick
/// script, schedule tokens from the parallel timetable cells.
///
/// The course list and the schedule cells come from two independent selector
/// passes aligned by position; a count mismatch means the page no longer
/// looks like we expect, so it fails the whole call instead of guessing.
fn extract_courses(doc: &Html) -> Result<Vec<CourseSummary>, PortalError> {
    let form_sel = Selector::parse("form[id^='form_acessarTurmaVirtual']").unwrap();
    let link_sel = Selector::parse("a[onclick]").unwrap();
    let schedule_sel = Selector::parse("td[class*='info'] center").unwrap();

    let mut courses = Vec::new();
    for form in doc.select(&form_sel) {
        let Some(link) = form.select(&link_sel).next() else {
            continue;
        };
        let name = element_text(link);
        let form_name = form.value().attr("name").unwrap_or("");
        let onclick = link.value().attr("onclick").unwrap_or("");
        if name.is_empty() || form_name.is_empty() || onclick.is_empty() {
            continue;
        }

        let front_end_id = parse_front_end_id(onclick).ok_or_else(|| {
            PortalError::parse("course list", format!("frontEndIdTurma missing for {name}"))
        })?;
        let component_id = parse_component_id(onclick).ok_or_else(|| {
            PortalError::parse(
                "course list",
                format!("self-referential component pair missing for {name}"),
            )
        })?;

        courses.push(CourseSummary {
            name,
            handle: NavigationHandle {
                front_end_id,
                form_name: form_name.to_string(),
                component_id,
            },
            ..CourseSummary::default()
        });
    }

    let cells: Vec<ElementRef> = doc.select(&schedule_sel).collect();
    if cells.len() != courses.len() {
        return Err(PortalError::parse(
            "course list",
            format!(
                "{} schedule cells for {} courses",
                cells.len(),
                courses.len()
            ),
        ));
    }
    for (course, cell) in courses.iter_mut().zip(cells) {
        course.schedule = cell
            .text()
            .collect::<String>()
            .split_whitespace()
            .filter(|token| *token != "*")
            .map(str::to_string)
            .collect();
    }

    Ok(courses)
}

const AGENDA_ROW_SELECTOR: &str = "#agenda-docente > table > tbody > tr > td > table tr";

fn extract_indices(doc: &Html) -> AcademicIndices {
    let row_sel = Selector::parse(AGENDA_ROW_SELECTOR).unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut indices = AcademicIndices::default();
    for row in doc.select(&row_sel) {
        let cells: Vec<String> = row.select(&td_sel).map(element_text).collect();
        // Index rows lay out two label/value pairs side by side.
        if cells.len() != 4 {
            continue;
        }
        match cells[0].as_str() {
            "MC:" => indices.mc = cells[1].clone(),
            "MCN:" => indices.mcn = cells[1].clone(),
            "IEPL:" => indices.iepl = cells[1].clone(),
            "IEAN:" => indices.iean = cells[1].clone(),
            _ => {}
        }
        match cells[2].as_str() {
            "IRA:" => indices.ira = cells[3].clone(),
            "IECH:" => indices.iech = cells[3].clone(),
            "IEA:" => indices.iea = cells[3].clone(),
            "IECHP:" => indices.iechp = cells[3].clone(),
            _ => {}
        }
    }
    indices
}

fn extract_workload(doc: &Html) -> WorkloadSummary {
    let row_sel = Selector::parse(AGENDA_ROW_SELECTOR).unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut workload = WorkloadSummary::default();
    for row in doc.select(&row_sel) {
        let cells: Vec<String> = row.select(&td_sel).map(element_text).collect();
        if cells.len() != 2 {
            continue;
        }
        match cells[0].as_str() {
            "CH. Obrigatória Pendente" => workload.pending_mandatory = cells[1].clone(),
            "CH. Optativa Pendente" => workload.pending_elective = cells[1].clone(),
            "CH. Complementar Pendente" => workload.pending_supplementary = cells[1].clone(),
            "CH. Total Currículo" => workload.curriculum_total = cells[1].clone(),
            _ => {}
        }
    }
    workload
}

fn extract_assessments(doc: &Html) -> Vec<Assessment> {
    let row_sel = Selector::parse("#avaliacao-portal table tbody tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();
    let small_sel = Selector::parse("small").unwrap();

    doc.select(&row_sel)
        .skip(1) // header row
        .map(|row| {
            let cells: Vec<ElementRef> = row.select(&td_sel).collect();
            let date = cells
                .get(1)
                .map(|cell| {
                    cell.text()
                        .collect::<String>()
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            let activity = cells
                .get(2)
                .and_then(|cell| cell.select(&small_sel).next())
                .map(element_text)
                .unwrap_or_default();
            split_activity(&activity, date)
        })
        .collect()
}

/// The activity cell compounds "<course> <kind>: <name>"; the kind is the
/// last word before the first colon.
fn split_activity(activity: &str, date: String) -> Assessment {
    let (before, after) = match activity.split_once(':') {
        Some((before, after)) => (before, Some(after)),
        None => (activity, None),
    };
    let kind = before.split_whitespace().last().unwrap_or("").to_string();
    let course_name = if kind.is_empty() {
        before.trim().to_string()
    } else {
        before.replace(&kind, "").trim().to_string()
    };
    Assessment {
        course_name,
        date,
        kind,
        name: after.map(|name| name.trim().to_string()).unwrap_or_default(),
    }
}
