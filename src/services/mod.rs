pub mod authoring;
pub mod grading;
pub mod warn_writer;

pub use authoring::{build_commit, AuthoringService, Container};
pub use grading::{GradeStats, GradingService};
pub use warn_writer::WarnWriter;
