//! Pulling the visit schedule from a Google spreadsheet.

pub mod client;
pub mod reconcile;
pub mod types;

use thiserror::Error;

pub use client::SheetsClient;
pub use reconcile::{SyncPlan, collect_rows, plan};

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("The Google Sheet {0} is not configured. Set it with `kbv settings`.")]
    MissingConfig(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Google Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No schedule rows found in the available tabs: {}", .0.join(", "))]
    NoData(Vec<String>),
}

/// A read-only source of spreadsheet tabs.
pub trait SheetSource {
    /// Titles of every tab, in spreadsheet order.
    fn sheet_titles(&self) -> Result<Vec<String>, SheetsError>;

    /// The cell grid of one tab. Rows may have different lengths.
    fn sheet_values(&self, title: &str) -> Result<Vec<Vec<String>>, SheetsError>;
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;

    use super::{SheetSource, SheetsError};

    /// An in-memory spreadsheet. Tabs listed in `failing` return an API error.
    #[derive(Default)]
    pub struct FakeSheet {
        pub tabs: Vec<(String, Vec<Vec<String>>)>,
        pub failing: Vec<String>,
        pub unreachable: bool,
    }

    impl FakeSheet {
        pub fn with_tab(mut self, title: &str, rows: &[&[&str]]) -> Self {
            let rows = rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect();
            self.tabs.push((title.to_string(), rows));
            self
        }

        pub fn with_failing_tab(mut self, title: &str) -> Self {
            self.tabs.push((title.to_string(), Vec::new()));
            self.failing.push(title.to_string());
            self
        }
    }

    impl SheetSource for FakeSheet {
        fn sheet_titles(&self) -> Result<Vec<String>, SheetsError> {
            if self.unreachable {
                return Err(SheetsError::Network("connection refused".into()));
            }
            Ok(self.tabs.iter().map(|(t, _)| t.clone()).collect())
        }

        fn sheet_values(&self, title: &str) -> Result<Vec<Vec<String>>, SheetsError> {
            if self.failing.iter().any(|t| t == title) {
                return Err(SheetsError::Api {
                    status: 400,
                    message: format!("Unable to parse range: {}", title),
                });
            }
            let tabs: HashMap<&str, &Vec<Vec<String>>> = self.tabs.iter().map(|(t, r)| (t.as_str(), r)).collect();
            Ok(tabs.get(title).map(|r| (*r).clone()).unwrap_or_default())
        }
    }
}
