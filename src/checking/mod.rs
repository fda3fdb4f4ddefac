pub mod answer_check;
pub mod validation;

pub use answer_check::{check_answer, check_value, estimated_band, expand_optional_answers, CheckOutcome, SlotResult};
pub use validation::{validate_commit, validate_typed};
