//! Moving transaction data in and out of the app as CSV.
//!
//! The CSV format is a fixed five column layout (`date,type,category,amount,note`)
//! shared by the import upload and the downloadable report.

mod csv;
mod import_endpoint;
mod import_page;

pub use csv::{CSV_HEADER, ImportReport, RejectedRow, export_csv, import_csv};
pub use import_endpoint::{ImportState, post_import_transactions};
pub use import_page::get_import_page;
