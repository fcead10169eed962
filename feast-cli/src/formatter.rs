use colored::*;
use feast_client::{Row, proto::GetFeastServingInfoResponse};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct RowList(pub Vec<Row>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<GetFeastServingInfoResponse> for FormattedString {
    fn from(info: GetFeastServingInfoResponse) -> Self {
        serde_json::json!({
            "version": info.version,
            "type": info.r#type().as_str_name(),
            "job_staging_location": info.job_staging_location,
        })
        .into()
    }
}

impl From<RowList> for FormattedString {
    fn from(RowList(rows): RowList) -> Self {
        serde_json::Value::Array(rows.iter().map(Row::to_json).collect()).into()
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        GenericError("Error:", format!("{err:#}")).into()
    }
}
