//! Menu data model, shaped like the upstream JSON.
//!
//! Everything the upstream does not always send is optional or defaulted, and
//! fields we do not model are kept in `extra` so the tree reaches the consumer
//! unmodified.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// One meal period as listed by the periods endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the periods endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodsResponse {
    pub periods: Vec<PeriodSummary>,
}

/// Menu for one period on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    pub period: Period,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub categories: Vec<Category>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A station or grouping within a period, e.g. "Grill".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sort_order: i64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub items: Vec<MenuItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One servable dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webtrition_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub custom_allergens: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nutrients: Vec<Nutrient>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub filters: Vec<Filter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A nutrition fact. `value` is kept exactly as sent ("12", "less than 1", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub uom: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_numeric: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dietary tag; `icon` says whether it applies to the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub icon: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_file_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sector_icon_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub custom_icons: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tolerant field decoders: numbers where the upstream usually sends strings,
/// and `null` wherever a field has a sensible default.
mod lenient {
    use {
        serde::{Deserialize, Deserializer, de::Error},
        serde_json::Value,
    };

    /// `null` decodes as the type's default.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        opt_string(deserializer).map(Option::unwrap_or_default)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(D::Error::custom(format!(
                "expected a string or number, got {other}"
            ))),
        }
    }
}
