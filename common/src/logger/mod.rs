mod init;
mod spans;
mod timing;
mod trace_id;

pub use init::init_logger;
pub use spans::{annotate_span, child_span, root_span};
pub use timing::warn_if_slow;
pub use trace_id::TraceId;
