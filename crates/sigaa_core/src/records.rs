use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifiers scraped from a course's entry link, required to post into that
/// course's detail view. Only valid within the session that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationHandle {
    pub front_end_id: String,
    pub form_name: String,
    pub component_id: String,
}

/// The eight academic index figures from the landing page, kept as the
/// portal renders them (locale-formatted numbers as text).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicIndices {
    pub mc: String,
    pub ira: String,
    pub mcn: String,
    pub iech: String,
    pub iepl: String,
    pub iea: String,
    pub iean: String,
    pub iechp: String,
}

/// Curriculum workload summary from the landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    pub pending_mandatory: String,
    pub pending_elective: String,
    pub pending_supplementary: String,
    pub curriculum_total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub indices: AcademicIndices,
    pub workload: WorkloadSummary,
}

/// Absence count for a course.
///
/// Serialized as the integer the existing front end expects: `-2` while no
/// attendance lookup has run, `-1` when the portal has not published
/// attendance yet, otherwise the count itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsenceCount {
    #[default]
    Undetermined,
    NotYetPublished,
    Total(u32),
}

const ABSENCES_UNDETERMINED: i64 = -2;
const ABSENCES_NOT_PUBLISHED: i64 = -1;

impl Serialize for AbsenceCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            AbsenceCount::Undetermined => ABSENCES_UNDETERMINED,
            AbsenceCount::NotYetPublished => ABSENCES_NOT_PUBLISHED,
            AbsenceCount::Total(count) => i64::from(*count),
        };
        serializer.serialize_i64(raw)
    }
}

impl<'de> Deserialize<'de> for AbsenceCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            ABSENCES_UNDETERMINED => Ok(AbsenceCount::Undetermined),
            ABSENCES_NOT_PUBLISHED => Ok(AbsenceCount::NotYetPublished),
            raw if raw >= 0 => {
                let count = u32::try_from(raw)
                    .map_err(|_| D::Error::custom("absence count out of range"))?;
                Ok(AbsenceCount::Total(count))
            }
            raw => Err(D::Error::custom(format!("invalid absence count {raw}"))),
        }
    }
}

/// Latest class news post, when the course has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// One syllabus topic: a title plus its free-text description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusItem {
    pub title: String,
    pub content: String,
}

/// One row of the grade report. `scores` is keyed by the report's own
/// assessment column labels; the fixed columns map to named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub code: String,
    pub name: String,
    pub scores: BTreeMap<String, String>,
    pub result: String,
    pub absences: String,
    pub situation: String,
}

/// A course as listed on the landing page, enriched in place by the detail
/// and grades flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub name: String,
    pub schedule: Vec<String>,
    pub handle: NavigationHandle,
    pub absences: AbsenceCount,
    pub news: Option<NewsItem>,
    pub syllabus: Vec<SyllabusItem>,
    pub grades: Option<GradeRecord>,
}

/// An upcoming assessment from the landing page's shared table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub course_name: String,
    pub date: String,
    pub kind: String,
    pub name: String,
}
