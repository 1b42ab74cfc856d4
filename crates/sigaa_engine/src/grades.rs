use reqwest::Method;
use scraper::{Html, Selector};

use sigaa_core::{GradeRecord, SessionToken, ViewState};

use crate::text::element_text;
use crate::transport::{PortalUrls, Transport};
use crate::viewstate::VIEW_STATE_FIELD;
use crate::{GradesReport, PortalError};

// Fixed payload of the "generate grade report" menu action.
const REPORT_MENU_FORM: &str = "menu:form_menu_discente";
const REPORT_MENU_ID: &str = "107543";
const REPORT_MENU_ACTION: &str =
    "menu_form_menu_discente_discente_menu:A]#{ relatorioNotasAluno.gerarRelatorio }";

// The report renders "--" where no score has been posted yet.
const EMPTY_SCORE_PLACEHOLDER: &str = "--";

/// Simulate the report-generation menu action and extract the grade table.
///
/// The caller's view state is handed back untouched: the report page is a
/// dead end that is never navigated past.
pub(crate) async fn fetch_grades(
    transport: &dyn Transport,
    urls: &PortalUrls,
    session: SessionToken,
    view_state: ViewState,
) -> Result<GradesReport, PortalError> {
    let landing = urls.landing();
    let menu_form = vec![
        (REPORT_MENU_FORM.to_string(), REPORT_MENU_FORM.to_string()),
        ("id".to_string(), REPORT_MENU_ID.to_string()),
        ("jscook_action".to_string(), REPORT_MENU_ACTION.to_string()),
        (
            VIEW_STATE_FIELD.to_string(),
            view_state.as_str().to_string(),
        ),
    ];
    let page = transport
        .execute(
            Method::POST,
            landing.clone(),
            &session,
            Some(&landing),
            Some(&menu_form),
        )
        .await?;
    let session = page.session.clone();

    let grades = {
        let doc = page.document();
        extract_grade_rows(&doc)
    };

    Ok(GradesReport {
        grades,
        session,
        view_state,
    })
}

/// One record per report row, each cell assigned by its header label so the
/// extraction is independent of column order.
fn extract_grade_rows(doc: &Html) -> Vec<GradeRecord> {
    let table_sel = Selector::parse("table.tabelaRelatorio").unwrap();
    let header_sel = Selector::parse("thead tr th").unwrap();
    let row_sel = Selector::parse("tbody tr.linha").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let Some(table) = doc.select(&table_sel).next() else {
        return Vec::new();
    };
    let headers: Vec<String> = table.select(&header_sel).map(element_text).collect();

    let mut records = Vec::new();
    for row in table.select(&row_sel) {
        let mut record = GradeRecord::default();
        for (index, cell) in row.select(&td_sel).enumerate() {
            let Some(header) = headers.get(index) else {
                break;
            };
            assign_cell(&mut record, header, element_text(cell));
        }
        // A row without a course name is a separator or summary, not a grade.
        if !record.name.is_empty() {
            records.push(record);
        }
    }
    records
}

fn assign_cell(record: &mut GradeRecord, header: &str, value: String) {
    match header {
        "Código" => record.code = value,
        "Disciplina" => record.name = value,
        "Resultado" => record.result = value,
        "Faltas" => record.absences = value,
        "Situação" => record.situation = value,
        _ => {
            if !value.is_empty() && value != EMPTY_SCORE_PLACEHOLDER {
                record.scores.insert(header.to_string(), value);
            }
        }
    }
}
