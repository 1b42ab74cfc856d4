//! Sigaa core: pure domain records and continuation-state newtypes.
//!
//! Everything here is a value record created fresh per engine call and handed
//! back to the caller; nothing holds network or session resources.
mod records;
mod session;

pub use records::{
    AbsenceCount, AcademicIndices, Assessment, CourseSummary, GradeRecord, NavigationHandle,
    NewsItem, StudentProfile, SyllabusItem, WorkloadSummary,
};
pub use session::{SessionToken, ViewState};
