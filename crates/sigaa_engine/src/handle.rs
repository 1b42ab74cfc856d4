//! Extraction of course navigation identifiers from the entry link's
//! `onclick` script text.
//!
//! The portal renders each course row as a tiny JSF form whose link submits a
//! generated key/value map. Nothing about that map is contractual, so the
//! matching lives here, behind two small functions with tests over captured
//! samples.

use std::sync::LazyLock;

use regex::Regex;

static FRONT_END_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'frontEndIdTurma':'([^']+)'").unwrap());

static COMPONENT_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(form_acessarTurmaVirtual[^']*)':'([^']*)'").unwrap());

/// First capture of the quoted `frontEndIdTurma` pair.
pub(crate) fn parse_front_end_id(onclick: &str) -> Option<String> {
    FRONT_END_ID_RE
        .captures(onclick)
        .map(|captures| captures[1].to_string())
}

/// The submit component's id is the unique self-referential pair in the
/// generated map: the one whose key equals its value.
pub(crate) fn parse_component_id(onclick: &str) -> Option<String> {
    COMPONENT_PAIR_RE
        .captures_iter(onclick)
        .find(|captures| captures[1] == captures[2])
        .map(|captures| captures[1].to_string())
}
