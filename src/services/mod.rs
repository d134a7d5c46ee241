pub mod input_normalizer;
pub mod response_classifier;
pub mod submission_log;

pub use input_normalizer::InputNormalizer;
pub use response_classifier::{classify_response, extract_error_message};
pub use submission_log::SubmissionLog;
