//! Boundary normalization of facility records.
//!
//! The monitoring API and its saved exports do not agree on field names
//! (`hospital_type` vs `type`, `latitude` vs `lat`, `state` vs `region`)
//! and bed counts arrive as numbers, strings or `null`. Everything is
//! mapped into [`FacilityRecord`] (and [`Department`] / [`StaffMember`] for
//! the detail view) here so the rest of the crate only sees one shape.

use crate::error::ApiError;
use crate::models::{
    Capabilities, Department, FacilityRecord, FacilityType, GeoPoint, StaffMember, UNKNOWN_REGION,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// A facility as it appears on the wire. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFacility {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub state: Option<Value>,
    pub region: Option<Value>,
    pub city: Option<Value>,
    pub hospital_type: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub facility_type: Option<Value>,
    pub total_beds: Option<Value>,
    pub occupied_beds: Option<Value>,
    pub latitude: Option<Value>,
    pub lat: Option<Value>,
    pub longitude: Option<Value>,
    pub lng: Option<Value>,
    pub has_oxygen: Option<Value>,
    pub has_ventilators: Option<Value>,
    pub has_ambulance: Option<Value>,
    pub has_emergency: Option<Value>,
    pub is_active: Option<Value>,
}

/// Map a wire record into the canonical record.
pub fn normalize_facility(raw: RawFacility) -> FacilityRecord {
    let region = first_text(&[&raw.state, &raw.region]).unwrap_or_else(|| UNKNOWN_REGION.to_string());

    // Missing type is PUBLIC; any other value that is not PUBLIC is PRIVATE.
    let facility_type = first_text(&[&raw.hospital_type, &raw.kind, &raw.facility_type])
        .map(|t| FacilityType::parse(&t).unwrap_or(FacilityType::Private))
        .unwrap_or_default();

    let latitude = first_coordinate(&[&raw.latitude, &raw.lat]);
    let longitude = first_coordinate(&[&raw.longitude, &raw.lng]);
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let id = raw.id.as_ref().and_then(text).unwrap_or_default();
    let name = raw.name.as_ref().and_then(text).unwrap_or_default();

    let mut record = FacilityRecord::new(id, name, region)
        .with_beds(
            bed_count(raw.total_beds.as_ref()),
            bed_count(raw.occupied_beds.as_ref()),
        )
        .with_type(facility_type);

    record.city = raw.city.as_ref().and_then(text);
    record.capabilities = Capabilities {
        has_oxygen: flag(raw.has_oxygen.as_ref(), false),
        has_ventilators: flag(raw.has_ventilators.as_ref(), false),
        has_ambulance: flag(raw.has_ambulance.as_ref(), false),
        has_emergency: flag(raw.has_emergency.as_ref(), false),
    };
    record.location = location;
    record.is_active = flag(raw.is_active.as_ref(), true);

    record
}

/// A department as it appears on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDepartment {
    pub id: Option<Value>,
    pub hospital_id: Option<Value>,
    pub name: Option<Value>,
    pub department_type: Option<Value>,
}

/// A staff member as it appears on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawStaff {
    pub id: Option<Value>,
    pub hospital_id: Option<Value>,
    pub department_id: Option<Value>,
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub role: Option<Value>,
    pub email: Option<Value>,
    pub is_active: Option<Value>,
}

pub fn normalize_department(raw: RawDepartment) -> Department {
    Department {
        id: raw.id.as_ref().and_then(text).unwrap_or_default(),
        hospital_id: raw.hospital_id.as_ref().and_then(text).unwrap_or_default(),
        name: raw.name.as_ref().and_then(text).unwrap_or_default(),
        department_type: raw
            .department_type
            .as_ref()
            .and_then(text)
            .map(|t| t.to_uppercase())
            .unwrap_or_default(),
    }
}

pub fn normalize_staff(raw: RawStaff) -> StaffMember {
    StaffMember {
        id: raw.id.as_ref().and_then(text).unwrap_or_default(),
        hospital_id: raw.hospital_id.as_ref().and_then(text).unwrap_or_default(),
        department_id: raw.department_id.as_ref().and_then(text),
        first_name: raw.first_name.as_ref().and_then(text).unwrap_or_default(),
        last_name: raw.last_name.as_ref().and_then(text).unwrap_or_default(),
        role: raw
            .role
            .as_ref()
            .and_then(text)
            .map(|t| t.to_uppercase())
            .unwrap_or_default(),
        email: raw.email.as_ref().and_then(text),
        is_active: flag(raw.is_active.as_ref(), true),
    }
}

/// Normalize a list of JSON values, skipping entries that are not objects.
pub fn normalize_all(values: Vec<Value>) -> Vec<FacilityRecord> {
    let total = values.len();
    let records: Vec<FacilityRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            if !value.is_object() {
                warn!("Skipping facility entry {}: not a JSON object", index);
                return None;
            }
            match serde_json::from_value::<RawFacility>(value) {
                Ok(raw) => Some(normalize_facility(raw)),
                Err(e) => {
                    warn!("Skipping facility entry {}: {}", index, e);
                    None
                }
            }
        })
        .collect();

    debug!("Normalized {} of {} facility entries", records.len(), total);
    records
}

/// Extract and normalize the facility list from a response body.
///
/// Accepts `{"data": {"hospitals": [...]}}`, `{"data": [...]}`,
/// `{"hospitals": [...]}` or a bare array.
pub fn facilities_from_envelope(body: &str) -> Result<Vec<FacilityRecord>, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let list = extract_list(value, "hospitals")?;
    Ok(normalize_all(list))
}

/// Extract a single facility from `{"data": {"hospital": {...}}}`,
/// `{"data": {...}}`, `{"hospital": {...}}` or a bare object.
pub fn facility_from_envelope(body: &str) -> Result<FacilityRecord, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let object = extract_object(value, "hospital")?;
    let raw: RawFacility = serde_json::from_value(object)?;
    Ok(normalize_facility(raw))
}

/// Extract the department list of the detail view.
pub fn departments_from_envelope(body: &str) -> Result<Vec<Department>, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let list = extract_list(value, "departments")?;
    Ok(decode_entries(list, "department", normalize_department))
}

/// Extract the staff list of the detail view.
pub fn staff_from_envelope(body: &str) -> Result<Vec<StaffMember>, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let list = extract_list(value, "staff")?;
    Ok(decode_entries(list, "staff", normalize_staff))
}

fn decode_entries<R, T>(values: Vec<Value>, kind: &str, normalize: fn(R) -> T) -> Vec<T>
where
    R: serde::de::DeserializeOwned,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            if !value.is_object() {
                warn!("Skipping {} entry {}: not a JSON object", kind, index);
                return None;
            }
            serde_json::from_value::<R>(value)
                .map(normalize)
                .map_err(|e| warn!("Skipping {} entry {}: {}", kind, index, e))
                .ok()
        })
        .collect()
}

fn extract_list(value: Value, key: &str) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                return extract_list(data, key);
            }
            match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Err(ApiError::UnexpectedShape(format!(
                    "\"{}\" is {}, expected an array",
                    key,
                    type_name(&other)
                ))),
                None => Err(ApiError::UnexpectedShape(format!(
                    "no \"data\" or \"{}\" field",
                    key
                ))),
            }
        }
        other => Err(ApiError::UnexpectedShape(format!(
            "body is {}, expected an object or array",
            type_name(&other)
        ))),
    }
}

fn extract_object(value: Value, key: &str) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                return extract_object(data, key);
            }
            match map.remove(key) {
                Some(inner @ Value::Object(_)) => Ok(inner),
                Some(other) => Err(ApiError::UnexpectedShape(format!(
                    "\"{}\" is {}, expected an object",
                    key,
                    type_name(&other)
                ))),
                None => Ok(Value::Object(map)),
            }
        }
        other => Err(ApiError::UnexpectedShape(format!(
            "body is {}, expected an object",
            type_name(&other)
        ))),
    }
}

/// The `meta.message` of an error envelope, if any.
pub fn envelope_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("meta")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Non-empty text from a string or number.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(candidates: &[&Option<Value>]) -> Option<String> {
    candidates.iter().find_map(|&v| v.as_ref().and_then(text))
}

/// A non-negative bed count. Anything unusable counts as zero.
fn bed_count(value: Option<&Value>) -> u32 {
    let count = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count.map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX))
}

/// A usable coordinate. Zero is treated as missing.
fn coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number != 0.0).then_some(number)
}

fn first_coordinate(candidates: &[&Option<Value>]) -> Option<f64> {
    candidates.iter().find_map(|&v| v.as_ref().and_then(coordinate))
}

fn flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            _ => default,
        },
        _ => default,
    }
}
