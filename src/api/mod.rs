//! Backend transport.
//!
//! [`StudyApi`] is the seam between orchestration and the network: the
//! gateway only ever talks to this trait, and [`HttpStudyApi`] is the
//! production implementation over reqwest.

mod http;
mod traits;

pub use http::{DEFAULT_BASE_URL, HttpStudyApi};
pub use traits::StudyApi;
