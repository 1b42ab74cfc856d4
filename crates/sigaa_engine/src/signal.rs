//! Protocol signals the portal reports through page text instead of status
//! codes. Every fetched page runs through [`classify`] before any extraction.

/// Outcome of scanning a rendered page for the portal's implicit markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    Ok,
    InvalidCredentials,
    SessionExpired,
}

// Fragments deliberately avoid accented characters so detection holds no
// matter how the page's accents survived decoding or entity-encoding.
const INVALID_CREDENTIALS_MARKER: &str = "rio e/ou senha inv";
const SESSION_EXPIRED_MARKER: &str = "foi expirada";

/// Scan the full rendered text for the two fixed protocol markers.
pub fn classify(text: &str) -> PageSignal {
    if text.contains(INVALID_CREDENTIALS_MARKER) {
        return PageSignal::InvalidCredentials;
    }
    if text.contains(SESSION_EXPIRED_MARKER) {
        return PageSignal::SessionExpired;
    }
    PageSignal::Ok
}
