mod dispatcher;

pub use dispatcher::{build_message, dispatch, DispatchResult, SmtpSettings};
