//! Pure functions for mapping transactions to and from CSV rows.

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::{
    Error,
    transaction::{Transaction, TransactionBuilder, format_date, parse_date},
    user::UserID,
};

/// The column layout shared by imports and the downloadable report.
pub const CSV_HEADER: [&str; 5] = ["date", "type", "category", "amount", "note"];

/// The outcome of parsing an uploaded CSV file.
///
/// Rows that pass validation become builders ready to be inserted, rows that
/// do not are collected so the user can be told exactly which lines were
/// skipped and why. A file with some bad rows still imports the good ones.
#[derive(Debug, PartialEq)]
pub struct ImportReport {
    /// The rows that passed validation, in file order.
    pub builders: Vec<TransactionBuilder>,
    /// The rows that were skipped.
    pub rejected: Vec<RejectedRow>,
}

/// A CSV row that could not be turned into a transaction.
#[derive(Debug, PartialEq)]
pub struct RejectedRow {
    /// The 1-based data row number, not counting the header.
    pub row: usize,
    /// A human readable reason for skipping the row.
    pub reason: String,
}

/// Serialize transactions as CSV, most recent first, with a header row.
///
/// Amounts are written with `f64`'s shortest round-trippable representation
/// so that exporting and re-importing reproduces the same values.
///
/// # Panics
///
/// Panics if writing to the in-memory buffer fails, which cannot happen.
pub fn export_csv(transactions: &[Transaction]) -> Vec<u8> {
    let mut writer = Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .expect("writing CSV to an in-memory buffer cannot fail");

    for transaction in transactions {
        writer
            .write_record([
                format_date(transaction.date).as_str(),
                &transaction.kind.to_string(),
                &transaction.category,
                &transaction.amount.to_string(),
                &transaction.note,
            ])
            .expect("writing CSV to an in-memory buffer cannot fail");
    }

    writer
        .into_inner()
        .expect("writing CSV to an in-memory buffer cannot fail")
}

/// Parse an uploaded CSV file into transaction builders owned by `user_id`.
///
/// Rows that fail validation are reported in [ImportReport::rejected] with
/// their 1-based data row number rather than aborting the whole import.
/// Duplicate rows are not detected, importing the same file twice doubles
/// the data.
///
/// # Errors
///
/// Returns an [Error::InvalidCSV] if the file does not start with the
/// expected `date,type,category,amount,note` header.
pub fn import_csv(data: &str, user_id: UserID) -> Result<ImportReport, Error> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    if !header_matches(headers) {
        return Err(Error::InvalidCSV(format!(
            "expected the header \"{}\", got \"{}\"",
            CSV_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut builders = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;

        match record {
            Ok(record) => match parse_row(&record, user_id) {
                Ok(builder) => builders.push(builder),
                Err(reason) => rejected.push(RejectedRow { row, reason }),
            },
            Err(error) => rejected.push(RejectedRow {
                row,
                reason: error.to_string(),
            }),
        }
    }

    Ok(ImportReport { builders, rejected })
}

fn header_matches(headers: &StringRecord) -> bool {
    headers.len() == CSV_HEADER.len()
        && headers
            .iter()
            .zip(CSV_HEADER)
            .all(|(got, want)| got.trim().eq_ignore_ascii_case(want))
}

fn parse_row(record: &StringRecord, user_id: UserID) -> Result<TransactionBuilder, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, got {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let date = parse_date(&record[0]).map_err(|error| error.to_string())?;
    let kind = record[1]
        .parse()
        .map_err(|error: Error| error.to_string())?;
    let amount: f64 = record[3]
        .parse()
        .map_err(|_| format!("\"{}\" is not a number", &record[3]))?;

    let builder = Transaction::build(user_id, amount, kind, &record[2], date).note(&record[4]);
    builder.validate().map_err(|error| error.to_string())?;

    Ok(builder)
}

#[cfg(test)]
mod csv_tests {
    use time::macros::date;

    use crate::{
        Error,
        csv_io::csv::{export_csv, import_csv},
        transaction::{Transaction, TransactionKind, create_transaction},
        user::UserID,
    };

    fn sample_user() -> UserID {
        UserID::new(1)
    }

    #[test]
    fn import_parses_valid_rows() {
        let data = "date,type,category,amount,note\n\
            2024-03-01,expense,groceries,12.5,weekly shop\n\
            2024-03-02,income,salary,1000,\n";

        let report = import_csv(data, sample_user()).unwrap();

        assert!(report.rejected.is_empty());
        assert_eq!(report.builders.len(), 2);
        assert_eq!(report.builders[0].category, "groceries");
        assert_eq!(report.builders[0].kind, TransactionKind::Expense);
        assert_eq!(report.builders[0].date, date!(2024 - 03 - 01));
        assert_eq!(report.builders[0].note, "weekly shop");
        assert_eq!(report.builders[1].amount, 1000.0);
    }

    #[test]
    fn import_reports_bad_rows_with_row_numbers() {
        let data = "date,type,category,amount,note\n\
            2024-03-01,expense,groceries,12.5,ok\n\
            2024-13-01,expense,groceries,12.5,bad date\n\
            2024-03-03,transfer,groceries,12.5,bad kind\n\
            2024-03-04,expense,groceries,-1,negative\n\
            2024-03-05,expense,,5,empty category\n";

        let report = import_csv(data, sample_user()).unwrap();

        assert_eq!(report.builders.len(), 1);
        let rejected_rows: Vec<usize> = report.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rejected_rows, vec![2, 3, 4, 5]);
    }

    #[test]
    fn import_rejects_wrong_header() {
        let data = "foo,bar\n1,2\n";

        assert!(matches!(
            import_csv(data, sample_user()),
            Err(Error::InvalidCSV(_))
        ));
    }

    #[test]
    fn import_accepts_header_only_file() {
        let report = import_csv("date,type,category,amount,note\n", sample_user()).unwrap();

        assert!(report.builders.is_empty());
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn export_then_import_round_trips() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        let user = crate::user::create_user(
            "alice",
            crate::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let transactions = vec![
            create_transaction(
                Transaction::build(
                    user.id,
                    12.5,
                    TransactionKind::Expense,
                    "groceries",
                    date!(2024 - 03 - 01),
                )
                .note("weekly shop"),
                &connection,
            )
            .unwrap(),
            create_transaction(
                Transaction::build(
                    user.id,
                    1000.0,
                    TransactionKind::Income,
                    "salary",
                    date!(2024 - 03 - 02),
                ),
                &connection,
            )
            .unwrap(),
        ];

        let exported = String::from_utf8(export_csv(&transactions)).unwrap();
        let report = import_csv(&exported, user.id).unwrap();

        assert!(report.rejected.is_empty());
        assert_eq!(report.builders.len(), transactions.len());

        for (builder, transaction) in report.builders.iter().zip(&transactions) {
            assert_eq!(builder.amount, transaction.amount);
            assert_eq!(builder.kind, transaction.kind);
            assert_eq!(builder.category, transaction.category);
            assert_eq!(builder.date, transaction.date);
            assert_eq!(builder.note, transaction.note);
        }
    }
}
