//! Tagged field value type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value of one field at one locale.
///
/// The service stores arbitrary JSON per field. Links and geographic
/// locations are recognized while converting and get their own variants,
/// so callers never have to inspect raw JSON objects for them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value (fits in i64).
    Integer(i64),
    /// Any other number.
    Number(f64),
    /// Text value.
    Text(String),
    /// Array of values.
    Array(Vec<FieldValue>),
    /// A link to another entry or asset.
    Link(Link),
    /// A geographic location.
    Location(Location),
    /// Any other JSON object.
    Object(BTreeMap<String, FieldValue>),
}

/// What a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Link to an entry.
    Entry,
    /// Link to an asset.
    Asset,
}

impl LinkType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "Entry" => Some(LinkType::Entry),
            "Asset" => Some(LinkType::Asset),
            _ => None,
        }
    }
}

/// An unresolved link to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Type of the linked resource.
    pub link_type: LinkType,
    /// Id of the linked resource.
    pub id: String,
}

impl Link {
    /// Creates a link to an entry.
    pub fn entry(id: impl Into<String>) -> Self {
        Self {
            link_type: LinkType::Entry,
            id: id.into(),
        }
    }

    /// Creates a link to an asset.
    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            link_type: LinkType::Asset,
            id: id.into(),
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Location {
    /// Creates a location.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl FieldValue {
    /// Converts a JSON value into a field value.
    ///
    /// Objects shaped like `{"sys": {"type": "Link", "linkType": .., "id": ..}}`
    /// become [`FieldValue::Link`]; objects holding exactly numeric `lat` and
    /// `lon` become [`FieldValue::Location`].
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => FieldValue::Null,
            Json::Bool(b) => FieldValue::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => FieldValue::Text(s.clone()),
            Json::Array(items) => FieldValue::Array(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => {
                if let Some(link) = link_from_json(map) {
                    return FieldValue::Link(link);
                }
                if let Some(location) = location_from_json(map) {
                    return FieldValue::Location(location);
                }
                FieldValue::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Self::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float. Integers are widened.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a list of strings.
    ///
    /// Returns `None` unless this is an array whose every element is text.
    pub fn as_text_array(&self) -> Option<Vec<&str>> {
        self.as_array()?.iter().map(FieldValue::as_text).collect()
    }

    /// Get this value as a link, if it is one.
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            FieldValue::Link(link) => Some(link),
            _ => None,
        }
    }

    /// Get this value as a location, if it is one.
    pub fn as_location(&self) -> Option<Location> {
        match self {
            FieldValue::Location(location) => Some(*location),
            _ => None,
        }
    }

    /// Get this value as an object, if it is one.
    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in this object value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_object()?.get(key)
    }
}

fn link_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Option<Link> {
    let sys = map.get("sys")?.as_object()?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }
    let link_type = LinkType::parse(sys.get("linkType")?.as_str()?)?;
    let id = sys.get("id")?.as_str()?.to_string();
    Some(Link { link_type, id })
}

fn location_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Option<Location> {
    if map.len() != 2 {
        return None;
    }
    let lat = map.get("lat")?.as_f64()?;
    let lon = map.get("lon")?.as_f64()?;
    Some(Location { lat, lon })
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Link> for FieldValue {
    fn from(link: Link) -> Self {
        FieldValue::Link(link)
    }
}

impl From<Location> for FieldValue {
    fn from(location: Location) -> Self {
        FieldValue::Location(location)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for FieldValue {
    fn from((): ()) -> Self {
        FieldValue::Null
    }
}
