//! # Error Taxonomy
//!
//! Every fallible operation in geodict returns `eyre::Result`, with context
//! attached along the way (`wrap_err_with`). The hard failures the build can
//! hit are represented by [`DictError`], which sits at the root of the report
//! so callers can classify a failure:
//!
//! ```ignore
//! match report.downcast_ref::<DictError>() {
//!     Some(DictError::InputFormat { origin, line_no, .. }) => { /* report location */ }
//!     Some(DictError::StoreCorruption { .. }) => { /* restart the build */ }
//!     _ => {}
//! }
//! ```
//!
//! Duplicate addresses are not errors; they are dropped and counted.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    #[error("{origin}:{line_no}: malformed address line: {reason}")]
    InputFormat {
        origin: String,
        line_no: usize,
        reason: String,
    },

    #[error("store corruption in table '{table}': {detail}")]
    StoreCorruption { table: String, detail: String },

    #[error("sibling fix-up for node {target} cannot be resolved: {detail}")]
    FixupUnresolved { target: u64, detail: String },

    #[error("input is not sorted: '{current}' arrived after '{previous}'")]
    UnsortedInput { previous: String, current: String },
}

impl DictError {
    pub fn input_format(origin: &str, line_no: usize, reason: impl Into<String>) -> Self {
        DictError::InputFormat {
            origin: origin.to_string(),
            line_no,
            reason: reason.into(),
        }
    }

    pub fn corruption(table: &str, detail: impl Into<String>) -> Self {
        DictError::StoreCorruption {
            table: table.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether the failure was caused by the input rather than by the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DictError::InputFormat { .. } | DictError::UnsortedInput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_format_display_names_location() {
        let err = DictError::input_format("13_city.txt", 42, "missing coordinates");
        assert_eq!(
            err.to_string(),
            "13_city.txt:42: malformed address line: missing coordinates"
        );
    }

    #[test]
    fn classification() {
        assert!(DictError::input_format("a", 1, "x").is_input_error());
        assert!(!DictError::corruption("address_node", "x").is_input_error());
    }

    #[test]
    fn survives_eyre_round_trip() {
        let report: eyre::Report = DictError::corruption("address_node", "bad magic").into();
        let report = report.wrap_err("failed to read record 7");

        assert!(matches!(
            report.downcast_ref::<DictError>(),
            Some(DictError::StoreCorruption { .. })
        ));
    }
}
