//! Data models for facility analytics.
//!
//! This module contains the canonical facility record produced by
//! boundary normalization, the derived region rollups, occupancy
//! classifications, the facility detail records (departments and staff),
//! and the report structures built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Region key used when a facility has no region.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Ownership type of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FacilityType {
    /// Government-run facility
    #[default]
    Public,
    /// Privately-run facility
    Private,
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityType::Public => write!(f, "PUBLIC"),
            FacilityType::Private => write!(f, "PRIVATE"),
        }
    }
}

impl FacilityType {
    /// Parse a wire value case-insensitively. Unrecognized values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PUBLIC" => Some(FacilityType::Public),
            "PRIVATE" => Some(FacilityType::Private),
            _ => None,
        }
    }
}

/// Equipment and service flags reported for a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub has_oxygen: bool,
    pub has_ventilators: bool,
    pub has_ambulance: bool,
    pub has_emergency: bool,
}

impl Capabilities {
    /// Short labels for the capabilities that are present.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.has_oxygen {
            labels.push("Oxygen");
        }
        if self.has_ventilators {
            labels.push("Ventilators");
        }
        if self.has_ambulance {
            labels.push("Ambulance");
        }
        if self.has_emergency {
            labels.push("Emergency");
        }
        labels
    }
}

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Canonical facility record.
///
/// Only `normalize` builds these from wire data; everything downstream
/// relies on the defaults already being applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// State or province, `"Unknown"` when absent.
    pub region: String,
    /// City, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Total bed capacity.
    pub total_beds: u32,
    /// Beds currently occupied. May exceed `total_beds` in upstream data.
    pub occupied_beds: u32,
    /// Ownership type.
    pub facility_type: FacilityType,
    /// Capability flags.
    pub capabilities: Capabilities,
    /// Map location, if both coordinates were reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Whether the facility is marked active.
    pub is_active: bool,
}

impl FacilityRecord {
    /// Creates a facility with zero beds and no optional data.
    pub fn new(id: impl Into<String>, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            region: region.into(),
            city: None,
            total_beds: 0,
            occupied_beds: 0,
            facility_type: FacilityType::Public,
            capabilities: Capabilities::default(),
            location: None,
            is_active: true,
        }
    }

    /// Sets bed counts.
    pub fn with_beds(mut self, total_beds: u32, occupied_beds: u32) -> Self {
        self.total_beds = total_beds;
        self.occupied_beds = occupied_beds;
        self
    }

    /// Sets the facility type.
    pub fn with_type(mut self, facility_type: FacilityType) -> Self {
        self.facility_type = facility_type;
        self
    }

    /// Region key used for grouping.
    pub fn region_key(&self) -> &str {
        if self.region.trim().is_empty() {
            UNKNOWN_REGION
        } else {
            &self.region
        }
    }
}

/// Occupancy severity used for color-coded display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Below 50% occupancy
    Normal,
    /// 50% to 79% occupancy
    Elevated,
    /// 80% occupancy or more
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => write!(f, "Normal"),
            Severity::Elevated => write!(f, "Elevated"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Normal => "🟢",
            Severity::Elevated => "🟡",
            Severity::Critical => "🔴",
        }
    }
}

/// Occupancy percentage and its severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyClass {
    /// Rounded occupancy percentage. Not clamped; may exceed 100.
    pub ratio_percent: u32,
    pub severity: Severity,
}

impl OccupancyClass {
    /// Percentage for a visual gauge, clamped to 100.
    pub fn gauge_percent(&self) -> u32 {
        self.ratio_percent.min(100)
    }

    /// True when more beds are occupied than exist.
    pub fn is_over_capacity(&self) -> bool {
        self.ratio_percent > 100
    }
}

/// Aggregated summary of all facilities sharing a region key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRollup {
    pub region_name: String,
    pub facility_count: usize,
    pub total_beds_sum: u64,
    pub occupied_beds_sum: u64,
    /// Member facilities at or above 80% occupancy.
    pub critical_count: usize,
}

impl RegionRollup {
    /// Creates an empty rollup for a region.
    pub fn new(region_name: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            ..Self::default()
        }
    }

    /// Region-wide occupancy over the summed bed counts.
    pub fn occupancy(&self) -> OccupancyClass {
        crate::analysis::classify_occupancy(self.total_beds_sum, self.occupied_beds_sum)
    }
}

/// A facility paired with its occupancy classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityOccupancy {
    pub facility: FacilityRecord,
    pub occupancy: OccupancyClass,
}

/// Headline statistics for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_facilities: usize,
    pub public_facilities: usize,
    pub private_facilities: usize,
    pub total_beds: u64,
    pub occupied_beds: u64,
    /// Facilities at or above 80% occupancy.
    pub critical_facilities: usize,
}

impl Overview {
    /// National occupancy over all beds.
    pub fn occupancy(&self) -> OccupancyClass {
        crate::analysis::classify_occupancy(self.total_beds, self.occupied_beds)
    }
}

/// A department of a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub hospital_id: String,
    pub name: String,
    /// `MEDICAL`, `ADMIN` or `SUPPORT` on the backend.
    pub department_type: String,
}

/// A registered staff member of a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub hospital_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// `DOCTOR`, `NURSE`, `ADMIN` or `SUPPORT` on the backend.
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// One facility with its departments and staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDetail {
    pub facility: FacilityRecord,
    pub departments: Vec<Department>,
    pub staff: Vec<StaffMember>,
}

impl FacilityDetail {
    pub fn occupancy(&self) -> OccupancyClass {
        crate::analysis::classify_occupancy(
            u64::from(self.facility.total_beds),
            u64::from(self.facility.occupied_beds),
        )
    }

    /// Staff members with the `DOCTOR` or `NURSE` role.
    pub fn medical_staff_count(&self) -> usize {
        self.staff
            .iter()
            .filter(|s| matches!(s.role.as_str(), "DOCTOR" | "NURSE"))
            .count()
    }
}

/// Metadata about the analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the facility data came from (API URL or file path).
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Facilities fetched before filtering.
    pub facilities_loaded: usize,
    /// Facilities remaining after filtering.
    pub facilities_reported: usize,
    /// Human-readable description of the active filter.
    pub filter: String,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub overview: Overview,
    /// Region rollups, most critical first.
    pub regions: Vec<RegionRollup>,
    /// Fullest facilities, highest occupancy first.
    pub most_occupied: Vec<FacilityOccupancy>,
    /// Per-facility classifications, in input order.
    pub facilities: Vec<FacilityOccupancy>,
    /// Map markers for facilities with a location.
    pub markers: Vec<crate::analysis::MapMarker>,
    /// Detail view of a single facility, when one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<FacilityDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Normal < Severity::Elevated);
        assert!(Severity::Elevated < Severity::Critical);
    }

    #[test]
    fn test_severity_emoji() {
        assert_eq!(Severity::Critical.emoji(), "🔴");
        assert_eq!(Severity::Elevated.emoji(), "🟡");
        assert_eq!(Severity::Normal.emoji(), "🟢");
    }

    #[test]
    fn test_facility_type_parse() {
        assert_eq!(FacilityType::parse("public"), Some(FacilityType::Public));
        assert_eq!(FacilityType::parse(" Private "), Some(FacilityType::Private));
        assert_eq!(FacilityType::parse("mission"), None);
    }

    #[test]
    fn test_region_key_blank() {
        let facility = FacilityRecord::new("1", "General", "   ");
        assert_eq!(facility.region_key(), UNKNOWN_REGION);

        let facility = FacilityRecord::new("2", "General", "Lagos");
        assert_eq!(facility.region_key(), "Lagos");
    }

    #[test]
    fn test_gauge_clamps_but_ratio_does_not() {
        let class = OccupancyClass {
            ratio_percent: 130,
            severity: Severity::Critical,
        };
        assert_eq!(class.gauge_percent(), 100);
        assert!(class.is_over_capacity());
        assert_eq!(class.ratio_percent, 130);
    }

    #[test]
    fn test_capability_labels() {
        let caps = Capabilities {
            has_oxygen: true,
            has_emergency: true,
            ..Capabilities::default()
        };
        assert_eq!(caps.labels(), vec!["Oxygen", "Emergency"]);
    }

    #[test]
    fn test_detail_counts() {
        let member = |id: &str, role: &str| StaffMember {
            id: id.to_string(),
            hospital_id: "h1".to_string(),
            department_id: None,
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            role: role.to_string(),
            email: None,
            is_active: true,
        };
        let detail = FacilityDetail {
            facility: FacilityRecord::new("h1", "Lagos General", "Lagos").with_beds(10, 8),
            departments: Vec::new(),
            staff: vec![member("s1", "DOCTOR"), member("s2", "NURSE"), member("s3", "ADMIN")],
        };

        assert_eq!(detail.medical_staff_count(), 2);
        assert_eq!(detail.staff[0].full_name(), "Ada Obi");
        assert_eq!(detail.occupancy().ratio_percent, 80);
        assert_eq!(detail.occupancy().severity, Severity::Critical);
    }

    #[test]
    fn test_facility_type_serializes_uppercase() {
        let json = serde_json::to_string(&FacilityType::Private).unwrap();
        assert_eq!(json, "\"PRIVATE\"");
    }
}
