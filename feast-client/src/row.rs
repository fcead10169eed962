//! # Rows
//!
//! [`Row`] is the user-facing unit of a feature lookup. On the way in, a row names the
//! entities to look up (e.g. `driver_id = 123`) at an entity timestamp. On the way out,
//! a fresh row is built per response entry holding the returned entity and feature values
//! together with their retrieval [`FieldStatus`].
use crate::proto::{EntityRow, FieldValues, feast::types::value::Val};
use prost_types::{Timestamp, TimestampError};
use std::{collections::HashMap, fmt, time::SystemTime};

pub use crate::proto::feast::{
    serving::get_online_features_response::FieldStatus, types::Value,
};

/// A set of named values sharing a single entity timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    entity_timestamp: Timestamp,
    fields: HashMap<String, Value>,
    statuses: HashMap<String, FieldStatus>,
}

impl Row {
    /// Creates an empty row stamped with the current time.
    pub fn create() -> Self {
        Self {
            entity_timestamp: Timestamp::from(SystemTime::now()),
            fields: HashMap::new(),
            statuses: HashMap::new(),
        }
    }

    /// Sets a field with the [`FieldStatus::Present`] status.
    pub fn set(self, field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_with_status(field_name, value, FieldStatus::Present)
    }

    /// Sets a field together with an explicit status.
    pub fn set_with_status(
        mut self,
        field_name: impl Into<String>,
        value: impl Into<Value>,
        status: FieldStatus,
    ) -> Self {
        self.insert(field_name.into(), value.into(), status);
        self
    }

    pub fn set_entity_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.entity_timestamp = Timestamp::from(timestamp);
        self
    }

    /// Sets the entity timestamp from an RFC 3339 string, e.g. `2021-02-01T10:15:00Z`.
    pub fn set_entity_timestamp_str(mut self, timestamp: &str) -> Result<Self, TimestampError> {
        self.entity_timestamp = timestamp.parse()?;
        Ok(self)
    }

    pub fn entity_timestamp(&self) -> &Timestamp {
        &self.entity_timestamp
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn statuses(&self) -> &HashMap<String, FieldStatus> {
        &self.statuses
    }

    pub fn status(&self, field_name: &str) -> Option<FieldStatus> {
        self.statuses.get(field_name).copied()
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.fields.get(field_name)
    }

    pub fn get_int(&self, field_name: &str) -> Option<i32> {
        match self.val(field_name)? {
            Val::Int32Val(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, field_name: &str) -> Option<i64> {
        match self.val(field_name)? {
            Val::Int64Val(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, field_name: &str) -> Option<f32> {
        match self.val(field_name)? {
            Val::FloatVal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, field_name: &str) -> Option<f64> {
        match self.val(field_name)? {
            Val::DoubleVal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, field_name: &str) -> Option<bool> {
        match self.val(field_name)? {
            Val::BoolVal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, field_name: &str) -> Option<&str> {
        match self.val(field_name)? {
            Val::StringVal(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, field_name: &str) -> Option<&[u8]> {
        match self.val(field_name)? {
            Val::BytesVal(v) => Some(v),
            _ => None,
        }
    }

    /// Renders the row as a JSON object with its timestamp, values and statuses.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<_, _> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect();

        let statuses: serde_json::Map<_, _> = self
            .statuses
            .iter()
            .map(|(name, status)| (name.clone(), status.as_str_name().into()))
            .collect();

        serde_json::json!({
            "entity_timestamp": self.entity_timestamp.to_string(),
            "fields": fields,
            "statuses": statuses,
        })
    }

    pub(crate) fn insert(&mut self, field_name: String, value: Value, status: FieldStatus) {
        self.fields.insert(field_name.clone(), value);
        self.statuses.insert(field_name, status);
    }

    fn val(&self, field_name: &str) -> Option<&Val> {
        self.fields.get(field_name)?.val.as_ref()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<&Row> for EntityRow {
    fn from(row: &Row) -> Self {
        EntityRow {
            timestamp: Some(row.entity_timestamp),
            fields: row.fields.clone(),
        }
    }
}

impl From<FieldValues> for Row {
    /// Copies every returned value into a fresh row.
    ///
    /// A field missing from the status map reads as [`FieldStatus::Invalid`], the protocol
    /// default for an absent map entry.
    fn from(field_values: FieldValues) -> Self {
        let FieldValues { fields, statuses } = field_values;
        let mut row = Row::create();

        for (name, value) in fields {
            let status = statuses
                .get(&name)
                .and_then(|s| FieldStatus::try_from(*s).ok())
                .unwrap_or(FieldStatus::Invalid);
            row.insert(name, value, status);
        }

        row
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;

    match &value.val {
        None => serde_json::Value::Null,
        Some(Val::BytesVal(v)) => json!(v),
        Some(Val::StringVal(v)) => json!(v),
        Some(Val::Int32Val(v)) => json!(v),
        Some(Val::Int64Val(v)) => json!(v),
        Some(Val::DoubleVal(v)) => json!(v),
        Some(Val::FloatVal(v)) => json!(v),
        Some(Val::BoolVal(v)) => json!(v),
        Some(Val::BytesListVal(v)) => json!(v.val),
        Some(Val::StringListVal(v)) => json!(v.val),
        Some(Val::Int32ListVal(v)) => json!(v.val),
        Some(Val::Int64ListVal(v)) => json!(v.val),
        Some(Val::DoubleListVal(v)) => json!(v.val),
        Some(Val::FloatListVal(v)) => json!(v.val),
        Some(Val::BoolListVal(v)) => json!(v.val),
    }
}

impl From<Val> for Value {
    fn from(val: Val) -> Self {
        Value { val: Some(val) }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Val::$variant(v.into()).into()
                }
            }
        )*
    };
}

impl_from_scalar! {
    i32 => Int32Val,
    i64 => Int64Val,
    f32 => FloatVal,
    f64 => DoubleVal,
    bool => BoolVal,
    String => StringVal,
    &str => StringVal,
    Vec<u8> => BytesVal,
    &[u8] => BytesVal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn set_defaults_to_present_status() {
        let row = Row::create().set("driver_id", 123);

        assert_eq!(row.get_int("driver_id"), Some(123));
        assert_eq!(row.status("driver_id"), Some(FieldStatus::Present));
    }

    #[test]
    fn set_with_status_keeps_explicit_status() {
        let row = Row::create().set_with_status("rating", 4.5_f64, FieldStatus::OutsideMaxAge);

        assert_eq!(row.get_double("rating"), Some(4.5));
        assert_eq!(row.status("rating"), Some(FieldStatus::OutsideMaxAge));
    }

    #[test]
    fn setting_a_field_twice_overwrites_it() {
        let row = Row::create().set("name", "a").set("name", "b");

        assert_eq!(row.fields().len(), 1);
        assert_eq!(row.get_string("name"), Some("b"));
    }

    #[test]
    fn typed_getters_reject_other_types() {
        let row = Row::create()
            .set("long", 7_i64)
            .set("float", 1.5_f32)
            .set("flag", true)
            .set("blob", vec![1_u8, 2, 3]);

        assert_eq!(row.get_long("long"), Some(7));
        assert_eq!(row.get_int("long"), None);
        assert_eq!(row.get_float("float"), Some(1.5));
        assert_eq!(row.get_double("float"), None);
        assert_eq!(row.get_bool("flag"), Some(true));
        assert_eq!(row.get_bytes("blob"), Some(&[1_u8, 2, 3][..]));
        assert_eq!(row.get_string("missing"), None);
    }

    #[test]
    fn entity_timestamp_can_be_overridden() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let row = Row::create().set_entity_timestamp(at);

        assert_eq!(row.entity_timestamp().seconds, 1_600_000_000);
        assert_eq!(row.entity_timestamp().nanos, 0);
    }

    #[test]
    fn entity_timestamp_parses_rfc3339() {
        let row = Row::create()
            .set_entity_timestamp_str("1970-01-01T00:01:40Z")
            .unwrap();

        assert_eq!(row.entity_timestamp().seconds, 100);
        assert!(Row::create().set_entity_timestamp_str("yesterday").is_err());
    }

    #[test]
    fn converts_to_entity_row() {
        let row = Row::create().set("driver_id", 1).set("city", "Jakarta");
        let entity_row = EntityRow::from(&row);

        assert_eq!(entity_row.timestamp.as_ref(), Some(row.entity_timestamp()));
        assert_eq!(entity_row.fields, *row.fields());
    }

    #[test]
    fn builds_from_field_values_with_statuses() {
        let field_values = FieldValues {
            fields: HashMap::from([
                ("driver_id".to_string(), Value::from(1_i64)),
                ("driver:trips".to_string(), Value::default()),
            ]),
            statuses: HashMap::from([
                ("driver_id".to_string(), FieldStatus::Present as i32),
                ("driver:trips".to_string(), FieldStatus::NotFound as i32),
            ]),
        };

        let row = Row::from(field_values);

        assert_eq!(row.get_long("driver_id"), Some(1));
        assert_eq!(row.status("driver_id"), Some(FieldStatus::Present));
        assert_eq!(row.get("driver:trips"), Some(&Value::default()));
        assert_eq!(row.status("driver:trips"), Some(FieldStatus::NotFound));
    }

    #[test]
    fn missing_status_reads_as_invalid() {
        let field_values = FieldValues {
            fields: HashMap::from([("a".to_string(), Value::from("x"))]),
            statuses: HashMap::new(),
        };

        assert_eq!(Row::from(field_values).status("a"), Some(FieldStatus::Invalid));
    }

    #[test]
    fn renders_as_json() {
        let row = Row::create()
            .set_entity_timestamp(SystemTime::UNIX_EPOCH)
            .set("driver_id", 5)
            .set_with_status("name", Value::default(), FieldStatus::NullValue);

        let json = row.to_json();

        assert_eq!(json["entity_timestamp"], "1970-01-01T00:00:00Z");
        assert_eq!(json["fields"]["driver_id"], 5);
        assert_eq!(json["fields"]["name"], serde_json::Value::Null);
        assert_eq!(json["statuses"]["driver_id"], "PRESENT");
        assert_eq!(json["statuses"]["name"], "NULL_VALUE");
        assert_eq!(row.to_string(), json.to_string());
    }
}
