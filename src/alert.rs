//! Alert system for displaying success and error messages to users.
//!
//! This module provides a unified way to display alert messages across the
//! application with consistent styling.

use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Success,
    Error,
}

/// Renders alert messages with appropriate styling
pub struct AlertTemplate<'a> {
    pub alert_type: AlertType,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> AlertTemplate<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    /// Create a new error alert without details
    pub fn error_simple(message: &'a str) -> Self {
        Self::error(message, "")
    }

    /// Render the alert as a maud fragment.
    pub fn markup(&self) -> Markup {
        let (container_style, title_style) = match self.alert_type {
            AlertType::Success => (
                "p-4 mb-4 rounded-lg bg-green-50 dark:bg-gray-800",
                "text-sm font-medium text-green-800 dark:text-green-400",
            ),
            AlertType::Error => (
                "p-4 mb-4 rounded-lg bg-red-50 dark:bg-gray-800",
                "text-sm font-medium text-red-800 dark:text-red-400",
            ),
        };

        html!(
            div class=(container_style) role="alert"
            {
                p class=(title_style) { (self.message) }

                @if !self.details.is_empty()
                {
                    p class="mt-2 text-sm text-gray-700 dark:text-gray-300" { (self.details) }
                }
            }
        )
    }
}

#[cfg(test)]
mod alert_tests {
    use crate::alert::AlertTemplate;

    #[test]
    fn error_alert_contains_message_and_details() {
        let markup = AlertTemplate::error("Something failed", "Check your input.").markup();
        let html = markup.into_string();

        assert!(html.contains("Something failed"));
        assert!(html.contains("Check your input."));
    }

    #[test]
    fn simple_error_omits_details_paragraph() {
        let markup = AlertTemplate::error_simple("Something failed").markup();
        let html = markup.into_string();

        assert_eq!(html.matches("<p").count(), 1);
    }
}
