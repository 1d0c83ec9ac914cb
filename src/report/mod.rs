mod html;
mod writer;

pub use html::{render_html, ReportDocument};
pub use writer::{export_report, list_reports, write_new_file, ReportEntry};
