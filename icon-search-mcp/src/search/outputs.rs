//! Output types for icon search tools
//!
//! Tool methods return JSON strings for the MCP protocol. Search envelopes,
//! icons and autocomplete results serialize directly from the domain types;
//! the types here cover the remaining responses and can be deserialized in
//! tests for type-safe validation.

use serde::{Deserialize, Serialize};

use crate::error::IconSearchError;
use crate::types::{Icon, LibraryInfo};

/// Serialize any tool response, falling back to an error object
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| r#"{"error":"Failed to serialize response","code":"ICON_SEARCH_ERROR"}"#.to_string())
}

/// Output from get_icon
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetIconOutput {
    pub icon: Icon,
}

/// Output from list_libraries
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListLibrariesOutput {
    pub libraries: Vec<LibraryInfo>,
    pub total_libraries: usize,
}

/// Error output for icon search tools
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorOutput {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorOutput {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn to_json(&self) -> String {
        to_json(self)
    }
}

impl From<&IconSearchError> for ErrorOutput {
    fn from(error: &IconSearchError) -> Self {
        Self {
            error: error.to_string(),
            code: error.code().as_str().to_string(),
            details: error.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_output_from_error() {
        let err = IconSearchError::icon_not_found("nope", "feather");
        let output = ErrorOutput::from(&err);
        assert_eq!(output.code, "ICON_NOT_FOUND");
        assert_eq!(output.details.as_ref().unwrap()["library"], "feather");

        let parsed: ErrorOutput = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(parsed, output);
    }

    #[test]
    fn test_error_output_omits_empty_details() {
        let json = ErrorOutput::new("bad", "VALIDATION_ERROR").to_json();
        assert_eq!(json, r#"{"error":"bad","code":"VALIDATION_ERROR"}"#);
    }
}
