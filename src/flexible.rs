//! Tolerant decoding for the analysis service's inconsistent wire formats.
//!
//! Two sources of inconsistency are absorbed here: integers that arrive either
//! as JSON numbers or as numeric strings, and scalar-category payloads that
//! arrive either flat or nested one level under `"response"`.

use log::debug;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::DecodeError;
use crate::wire::ResponseMetadata;

const RESPONSE_KEY: &str = "response";
const FINANCIAL_INFO_KEY: &str = "created_with_financial_contributions_info";

/// An integer that may be transmitted as `3` or `"3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlexibleInt(pub i64);

impl FlexibleInt {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<FlexibleInt> for i64 {
    fn from(v: FlexibleInt) -> Self {
        v.0
    }
}

impl Serialize for FlexibleInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

struct FlexibleIntVisitor;

impl<'de> Visitor<'de> for FlexibleIntVisitor {
    type Value = FlexibleInt;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or a string containing an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlexibleInt, E> {
        Ok(FlexibleInt(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlexibleInt, E> {
        i64::try_from(v)
            .map(FlexibleInt)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FlexibleInt, E> {
        v.parse::<i64>()
            .map(FlexibleInt)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for FlexibleInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlexibleIntVisitor)
    }
}

/// `deserialize_with` helper for plain `i64` fields sent in either encoding.
pub fn deserialize_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    FlexibleInt::deserialize(deserializer).map(i64::from)
}

/// `deserialize_with` helper for optional `i64` fields sent in either encoding.
pub fn deserialize_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<FlexibleInt>::deserialize(deserializer)?.map(i64::from))
}

/// `deserialize_with` helper for optional fields where a malformed value is
/// dropped (`None`) instead of failing the surrounding struct.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: de::DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value::<T>(raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            debug!("Dropping malformed optional field: {}", e);
            Ok(None)
        }
    }
}

/// Lenient variant of [`deserialize_opt_i64`].
pub fn deserialize_lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(deserialize_lenient::<D, FlexibleInt>(deserializer)?.map(i64::from))
}

/// Decodes a scalar that is either a JSON integer or a string holding only an
/// integer.
pub fn decode_flexible_int(field: &str, raw: &Value) -> Result<i64, DecodeError> {
    let mismatch = || DecodeError::TypeMismatch {
        field: field.to_string(),
        found: raw.to_string(),
    };
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(mismatch),
        Value::String(s) => s.parse::<i64>().map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// Which fields a scalar category requires from the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryShape {
    /// Political leaning: `lean` free text is required.
    Lean,
    /// The five-point scored categories: `lean` is not sent or is ignored.
    Scored,
}

/// The fields every scalar category contributes to the canonical record.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFields {
    pub rating: i64,
    pub lean: Option<String>,
    pub context: String,
    pub created_with_financial_contributions_info: bool,
    /// Only populated when the payload was read from the top level.
    pub metadata: Option<ResponseMetadata>,
}

/// One tolerated envelope layout. Candidates are tried in `ENVELOPE_SHAPES`
/// order and the first that decodes wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{ "response": { rating, lean, context, created_with_... } }`
    Nested,
    /// `{ rating, lean?, context, created_with_..., timestamp?, ... }`
    Flat,
}

pub const ENVELOPE_SHAPES: [EnvelopeShape; 2] = [EnvelopeShape::Nested, EnvelopeShape::Flat];

impl EnvelopeShape {
    fn name(&self) -> &'static str {
        match self {
            EnvelopeShape::Nested => "nested",
            EnvelopeShape::Flat => "flat",
        }
    }

    fn try_decode(&self, raw: &Value, category: CategoryShape) -> Result<CanonicalFields, DecodeError> {
        let top = raw
            .as_object()
            .ok_or_else(|| DecodeError::InvalidJson("expected a JSON object".to_string()))?;
        match self {
            EnvelopeShape::Nested => {
                let nested = top
                    .get(RESPONSE_KEY)
                    .and_then(Value::as_object)
                    .ok_or_else(|| DecodeError::MissingField(RESPONSE_KEY.to_string()))?;
                let mut fields = read_core_fields(nested, category)?;
                fields.metadata = None;
                Ok(fields)
            }
            EnvelopeShape::Flat => {
                let mut fields = read_core_fields(top, category)?;
                fields.metadata = match serde_json::from_value::<ResponseMetadata>(raw.clone()) {
                    Ok(metadata) => Some(metadata),
                    Err(e) => {
                        debug!("Ignoring unreadable response metadata: {}", e);
                        None
                    }
                };
                Ok(fields)
            }
        }
    }
}

fn read_core_fields(obj: &Map<String, Value>, category: CategoryShape) -> Result<CanonicalFields, DecodeError> {
    let rating = obj
        .get("rating")
        .ok_or_else(|| DecodeError::MissingField("rating".to_string()))
        .and_then(|raw| decode_flexible_int("rating", raw))?;

    let lean = match (obj.get("lean"), category) {
        (Some(Value::String(s)), _) => Some(s.clone()),
        (_, CategoryShape::Lean) => return Err(DecodeError::MissingField("lean".to_string())),
        (_, CategoryShape::Scored) => None,
    };

    let context = obj
        .get("context")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::MissingField("context".to_string()))?
        .to_string();

    let created_with_financial_contributions_info = obj
        .get(FINANCIAL_INFO_KEY)
        .and_then(Value::as_bool)
        .ok_or_else(|| DecodeError::MissingField(FINANCIAL_INFO_KEY.to_string()))?;

    Ok(CanonicalFields {
        rating,
        lean,
        context,
        created_with_financial_contributions_info,
        metadata: None,
    })
}

/// Reads the four canonical fields from whichever tolerated envelope the
/// payload uses.
pub fn decode_envelope(raw: &Value, category: CategoryShape) -> Result<CanonicalFields, DecodeError> {
    let mut last = None;
    for shape in ENVELOPE_SHAPES {
        match shape.try_decode(raw, category) {
            Ok(fields) => {
                debug!("Decoded {:?} payload using the {} envelope", category, shape.name());
                return Ok(fields);
            }
            Err(e) => {
                debug!("{} envelope did not match: {}", shape.name(), e);
                last = Some(e);
            }
        }
    }

    let tried = ENVELOPE_SHAPES
        .iter()
        .map(EnvelopeShape::name)
        .collect::<Vec<_>>()
        .join(", ");
    Err(DecodeError::NoMatchingShape {
        tried,
        last: Box::new(last.unwrap_or_else(|| DecodeError::InvalidJson("empty candidate list".to_string()))),
    })
}
