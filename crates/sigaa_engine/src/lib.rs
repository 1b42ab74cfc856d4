//! Sigaa engine: remote session emulation and extraction for the student
//! portal. Drives the portal's form-postback protocol over HTTP, threading
//! the session cookie and JSF view state through every step, and maps the
//! returned markup to domain records.
mod client;
mod course;
mod decode;
mod grades;
mod handle;
mod landing;
mod login;
mod signal;
mod text;
mod transport;
mod types;
mod viewstate;

pub use client::PortalClient;
pub use signal::{classify, PageSignal};
pub use transport::{
    PortalSettings, PortalUrls, ReqwestTransport, Transport, PORTAL_BASE_URL,
};
pub use types::{
    ChainAbort, CourseDetail, FetchedPage, GradesReport, LandingData, PortalError,
};
pub use viewstate::parse_view_state;
