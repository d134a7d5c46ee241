pub mod copy;
pub mod view;

pub use copy::{Clipboard, ClipboardBackend, CopyAffordance, CopyFeedback};
pub use view::{render_text, ErrorPanel, ResultRow, ResultsView, ViewState};
