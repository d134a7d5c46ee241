pub mod payload;
pub mod session;
pub mod snapshot;

pub use payload::{FlatValue, ResultPayload};
pub use session::SessionId;
pub use snapshot::{Attachment, RawForm, SubmissionSnapshot, ValidatedForm};
