pub mod answer;
pub mod grade;
pub mod loaders;
pub mod question;
pub mod question_type;
pub mod schema;
pub mod sheet;
pub mod submission;
pub mod user;

pub use answer::AnswerValue;
pub use loaders::{load_all_toml_files, load_toml_document, save_toml_document};
pub use question::{Question, QuestionCreate, TypedQuestion};
pub use question_type::{QuestionFamily, QUESTION_TYPE_CATEGORIES};
pub use sheet::{AnswerSheet, GradeSheet, QuestionSet};
pub use submission::SubmissionPayload;
pub use test::{SectionType, TestAttemptWithDetails, TestStructure};
pub use user::{User, UserRole};
