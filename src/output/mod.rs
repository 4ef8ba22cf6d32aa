//! Output module
//! Report envelopes and their console, JSON and Markdown renderings

pub mod formatter;
pub mod report;

pub use formatter::{save_report_to_file, ReportGenerator};
pub use report::{MatchReport, NormalizedSkills, Report, ReportBody};
