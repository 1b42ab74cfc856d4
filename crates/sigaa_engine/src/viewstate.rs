use scraper::{Html, Selector};

use sigaa_core::ViewState;

use crate::PortalError;

/// Form field name the JSF substrate validates on every postback.
pub(crate) const VIEW_STATE_FIELD: &str = "javax.faces.ViewState";

/// Pull the hidden continuation token out of a rendered page.
///
/// Every render carries exactly one current token; a page without one cannot
/// be navigated from, so absence is a parse failure for the current call.
pub fn parse_view_state(doc: &Html, context: &str) -> Result<ViewState, PortalError> {
    let input_sel = Selector::parse("input[name='javax.faces.ViewState']").unwrap();
    doc.select(&input_sel)
        .find_map(|input| input.value().attr("value"))
        .map(ViewState::new)
        .ok_or_else(|| PortalError::parse(context, "javax.faces.ViewState input not found"))
}
