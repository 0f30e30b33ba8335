pub mod issue;
pub mod types;

pub use issue::IssueReport;
pub use types::{Category, Classification, Severity};
