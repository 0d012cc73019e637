use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One time-ordered observation an indicator can read numeric fields from.
///
/// Algorithms never touch records directly; they go through a [`FieldPath`]
/// so the same calculator works on differently shaped inputs.
pub trait Record {
    /// Read the numeric value at `path`, or `None` if any segment is missing
    /// or the terminal value is not a number.
    fn field(&self, path: &FieldPath) -> Option<Decimal>;
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, path: &FieldPath) -> Option<Decimal> {
        (**self).field(path)
    }
}

/// A dotted field path such as `"high"` or `"quote.bid.price"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        };
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// A pure getter for this path, usable wherever a `Record -> number`
    /// function is expected.
    pub fn getter(&self) -> impl Fn(&dyn Record) -> Option<Decimal> + Clone + Send + Sync + 'static {
        let path = self.clone();
        move |record: &dyn Record| record.field(&path)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

// ---------------------------------------------------------------------------
// JSON records
// ---------------------------------------------------------------------------

impl Record for serde_json::Value {
    fn field(&self, path: &FieldPath) -> Option<Decimal> {
        let mut current = self;
        for segment in path.segments() {
            current = match current {
                serde_json::Value::Object(map) => map.get(segment)?,
                serde_json::Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        json_to_decimal(current)
    }
}

fn json_to_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}
