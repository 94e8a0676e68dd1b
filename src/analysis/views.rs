//! Dashboard view derivations.
//!
//! List filtering, map markers and the overview cards are all computed
//! from the same normalized facility list the aggregator consumes.

use crate::analysis::aggregator::is_critical;
use crate::models::{FacilityRecord, FacilityType, GeoPoint, Overview};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Facility type selection for the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Public,
    Private,
}

impl TypeFilter {
    fn matches(&self, facility_type: FacilityType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Public => facility_type == FacilityType::Public,
            TypeFilter::Private => facility_type == FacilityType::Private,
        }
    }
}

/// Combined type filter and name search.
#[derive(Debug, Clone, Default)]
pub struct FacilityFilter {
    pub facility_type: TypeFilter,
    /// Case-insensitive substring matched against the facility name.
    pub search: Option<String>,
}

impl FacilityFilter {
    pub fn matches(&self, facility: &FacilityRecord) -> bool {
        if !self.facility_type.matches(facility.facility_type) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => facility
                .name
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facility_type == TypeFilter::All
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

impl fmt::Display for FacilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_label = match self.facility_type {
            TypeFilter::All => "all types",
            TypeFilter::Public => "public only",
            TypeFilter::Private => "private only",
        };

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => write!(f, "{}, name contains \"{}\"", type_label, term),
            _ => write!(f, "{}", type_label),
        }
    }
}

/// Facilities matching the filter, in input order.
pub fn filter_facilities<'a>(
    facilities: &'a [FacilityRecord],
    filter: &FacilityFilter,
) -> Vec<&'a FacilityRecord> {
    facilities.iter().filter(|f| filter.matches(f)).collect()
}

/// Bed capacity band shown on a map popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityBand {
    /// No beds reported
    Empty,
    /// Fewer than 20 beds
    Limited,
    Adequate,
}

impl CapacityBand {
    pub fn from_beds(total_beds: u32) -> Self {
        match total_beds {
            0 => CapacityBand::Empty,
            1..=19 => CapacityBand::Limited,
            _ => CapacityBand::Adequate,
        }
    }

    /// Traffic-light color name.
    pub fn color(&self) -> &'static str {
        match self {
            CapacityBand::Empty => "red",
            CapacityBand::Limited => "orange",
            CapacityBand::Adequate => "green",
        }
    }
}

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub facility_id: String,
    pub name: String,
    pub position: GeoPoint,
    /// Marker icon follows facility type.
    pub kind: FacilityType,
    /// "City, Region" line for the popup.
    pub place: String,
    pub total_beds: u32,
    pub capacity: CapacityBand,
}

/// Markers for every facility that has a location.
pub fn map_markers(facilities: &[FacilityRecord]) -> Vec<MapMarker> {
    facilities
        .iter()
        .filter_map(|f| {
            let position = f.location?;
            let place = match f.city.as_deref() {
                Some(city) if !city.is_empty() => format!("{}, {}", city, f.region_key()),
                _ => f.region_key().to_string(),
            };

            Some(MapMarker {
                facility_id: f.id.clone(),
                name: f.name.clone(),
                position,
                kind: f.facility_type,
                place,
                total_beds: f.total_beds,
                capacity: CapacityBand::from_beds(f.total_beds),
            })
        })
        .collect()
}

impl Overview {
    /// Compute the overview cards from a facility list.
    pub fn from_facilities(facilities: &[FacilityRecord]) -> Self {
        let mut overview = Self {
            total_facilities: facilities.len(),
            ..Self::default()
        };

        for facility in facilities {
            match facility.facility_type {
                FacilityType::Public => overview.public_facilities += 1,
                FacilityType::Private => overview.private_facilities += 1,
            }

            overview.total_beds += u64::from(facility.total_beds);
            overview.occupied_beds += u64::from(facility.occupied_beds);

            if is_critical(facility.total_beds, facility.occupied_beds) {
                overview.critical_facilities += 1;
            }
        }

        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn facilities() -> Vec<FacilityRecord> {
        let mut general = FacilityRecord::new("1", "Lagos General Hospital", "Lagos")
            .with_beds(100, 85);
        general.city = Some("Ikeja".to_string());
        general.location = Some(GeoPoint {
            latitude: 6.6,
            longitude: 3.35,
        });

        let mut clinic = FacilityRecord::new("2", "Sunrise Clinic", "Kano")
            .with_beds(12, 3)
            .with_type(FacilityType::Private);
        clinic.location = Some(GeoPoint {
            latitude: 12.0,
            longitude: 8.5,
        });

        let teaching = FacilityRecord::new("3", "University Teaching Hospital", "Enugu")
            .with_beds(0, 0);

        vec![general, clinic, teaching]
    }

    #[test]
    fn test_filter_by_type() {
        let all = facilities();
        let filter = FacilityFilter {
            facility_type: TypeFilter::Private,
            search: None,
        };

        let matched = filter_facilities(&all, &filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Sunrise Clinic");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let all = facilities();
        let filter = FacilityFilter {
            facility_type: TypeFilter::All,
            search: Some("HOSPITAL".to_string()),
        };

        let matched = filter_facilities(&all, &filter);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_type_and_search_combined() {
        let all = facilities();
        let filter = FacilityFilter {
            facility_type: TypeFilter::Private,
            search: Some("hospital".to_string()),
        };

        assert!(filter_facilities(&all, &filter).is_empty());
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let filter = FacilityFilter {
            facility_type: TypeFilter::All,
            search: Some("  ".to_string()),
        };
        assert!(filter.is_empty());
        assert_eq!(filter_facilities(&facilities(), &filter).len(), 3);
    }

    #[test]
    fn test_filter_display() {
        let filter = FacilityFilter {
            facility_type: TypeFilter::Public,
            search: Some("general".to_string()),
        };
        assert_eq!(filter.to_string(), "public only, name contains \"general\"");
    }

    #[test]
    fn test_markers_skip_missing_location() {
        let markers = map_markers(&facilities());
        assert_eq!(markers.len(), 2);

        assert_eq!(markers[0].place, "Ikeja, Lagos");
        assert_eq!(markers[0].kind, FacilityType::Public);
        assert_eq!(markers[0].capacity, CapacityBand::Adequate);

        assert_eq!(markers[1].place, "Kano");
        assert_eq!(markers[1].kind, FacilityType::Private);
        assert_eq!(markers[1].capacity, CapacityBand::Limited);
    }

    #[test]
    fn test_capacity_band() {
        assert_eq!(CapacityBand::from_beds(0), CapacityBand::Empty);
        assert_eq!(CapacityBand::from_beds(19), CapacityBand::Limited);
        assert_eq!(CapacityBand::from_beds(20), CapacityBand::Adequate);
        assert_eq!(CapacityBand::Empty.color(), "red");
    }

    #[test]
    fn test_overview() {
        let overview = Overview::from_facilities(&facilities());

        assert_eq!(overview.total_facilities, 3);
        assert_eq!(overview.public_facilities, 2);
        assert_eq!(overview.private_facilities, 1);
        assert_eq!(overview.total_beds, 112);
        assert_eq!(overview.occupied_beds, 88);
        assert_eq!(overview.critical_facilities, 1);
        assert_eq!(overview.occupancy().ratio_percent, 79);
        assert_eq!(overview.occupancy().severity, Severity::Elevated);
    }

    #[test]
    fn test_overview_empty() {
        let overview = Overview::from_facilities(&[]);
        assert_eq!(overview, Overview::default());
        assert_eq!(overview.occupancy().ratio_percent, 0);
    }
}
