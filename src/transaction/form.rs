//! The shared form template and form data parsing for creating and editing transactions.

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    transaction::{Transaction, TransactionKind},
};

/// Date format used by HTML date inputs, e.g. "2024-01-31".
const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date string from a form or CSV field.
///
/// # Errors
///
/// Returns an [Error::InvalidDate] if `raw_date` is not a valid calendar date
/// in the format YYYY-MM-DD.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    Date::parse(raw_date.trim(), DATE_INPUT_FORMAT)
        .map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

/// Format a date the way HTML date inputs and CSV rows expect it.
pub fn format_date(date: Date) -> String {
    date.format(DATE_INPUT_FORMAT)
        .expect("formatting a date as YYYY-MM-DD cannot fail")
}

/// The raw data submitted by the transaction create and edit forms.
///
/// Fields are kept as strings so that parse errors surface as form alerts
/// rather than as rejections from the form extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFormData {
    pub amount: String,
    pub kind: String,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub note: String,
}

impl TransactionFormData {
    /// Parse the amount, kind, and date fields.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount], [Error::UnknownKind], or
    /// [Error::InvalidDate] for fields that do not parse. Amount sign and
    /// category invariants are checked later by the database layer.
    pub fn parse_fields(&self) -> Result<(f64, TransactionKind, Date), Error> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidAmount(self.amount.clone()))?;
        let kind = self.kind.parse()?;
        let date = parse_date(&self.date)?;

        Ok((amount, kind, date))
    }
}

fn kind_radio(kind: TransactionKind, label: &str, checked: bool) -> Markup {
    let id = format!("kind-{kind}");

    html! {
        label for=(id) class=(FORM_RADIO_LABEL_STYLE)
        {
            input
                type="radio"
                name="kind"
                id=(id)
                value=(kind)
                class=(FORM_RADIO_INPUT_STYLE)
                checked[checked];

            " " (label)
        }
    }
}

/// The form for entering transaction details, used by both the new and edit pages.
///
/// `action` is the endpoint the form posts to. `transaction` prefills the
/// fields when editing.
pub fn transaction_form(action: &str, submit_label: &str, transaction: Option<&Transaction>) -> Markup {
    let amount = transaction.map(|t| t.amount.to_string()).unwrap_or_default();
    let category = transaction.map(|t| t.category.as_str()).unwrap_or_default();
    let date = transaction.map(|t| format_date(t.date)).unwrap_or_default();
    let note = transaction.map(|t| t.note.as_str()).unwrap_or_default();
    let kind = transaction.map(|t| t.kind);

    html! {
        form method="post" action=(action) class="space-y-4 md:space-y-6 w-full max-w-md"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    name="amount"
                    id="amount"
                    step="0.01"
                    min="0"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(amount);
            }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (kind_radio(
                    TransactionKind::Income,
                    "Income",
                    kind == Some(TransactionKind::Income),
                ))
                (kind_radio(
                    TransactionKind::Expense,
                    "Expense",
                    kind != Some(TransactionKind::Income),
                ))
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    type="text"
                    name="category"
                    id="category"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(category);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(date);
            }

            div
            {
                label for="note" class=(FORM_LABEL_STYLE) { "Note" }

                input
                    type="text"
                    name="note"
                    id="note"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(note);
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
