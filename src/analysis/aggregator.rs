//! Facility aggregation and occupancy classification.
//!
//! Groups facilities by region into rollups and classifies per-facility
//! occupancy for color-coded display. Everything here is pure: inputs are
//! borrowed, never mutated, and every input (including an empty slice)
//! produces a result.

use crate::models::{FacilityOccupancy, FacilityRecord, OccupancyClass, RegionRollup, Severity};
use std::collections::HashMap;
use tracing::debug;

/// Occupancy percentage at or above which a facility is critical.
pub const CRITICAL_PERCENT: u32 = 80;

/// Occupancy percentage at or above which a facility is elevated.
pub const ELEVATED_PERCENT: u32 = 50;

/// Returns true when `occupied / total >= 0.8`.
///
/// Zero-bed facilities are never critical. Compared in integers so the
/// 80% boundary is exact.
pub fn is_critical(total_beds: u32, occupied_beds: u32) -> bool {
    total_beds > 0 && u64::from(occupied_beds) * 5 >= u64::from(total_beds) * 4
}

/// Group facilities by region and sort the rollups, most critical first.
///
/// Ties on `critical_count` are broken by region name ascending so the
/// order is identical across runs.
pub fn aggregate_by_region(facilities: &[FacilityRecord]) -> Vec<RegionRollup> {
    let mut by_region: HashMap<&str, RegionRollup> = HashMap::new();

    for facility in facilities {
        let key = facility.region_key();
        let rollup = by_region
            .entry(key)
            .or_insert_with(|| RegionRollup::new(key));

        rollup.facility_count += 1;
        rollup.total_beds_sum += u64::from(facility.total_beds);
        rollup.occupied_beds_sum += u64::from(facility.occupied_beds);

        if is_critical(facility.total_beds, facility.occupied_beds) {
            rollup.critical_count += 1;
        }
    }

    let mut rollups: Vec<RegionRollup> = by_region.into_values().collect();
    rollups.sort_by(|a, b| {
        b.critical_count
            .cmp(&a.critical_count)
            .then_with(|| a.region_name.cmp(&b.region_name))
    });

    debug!(
        "Aggregated {} facilities into {} regions",
        facilities.len(),
        rollups.len()
    );

    rollups
}

/// Classify an occupancy level.
///
/// `ratio_percent` is `round(occupied / total * 100)` with halves rounded
/// up, or 0 when there are no beds. It is not clamped.
pub fn classify_occupancy(total_beds: u64, occupied_beds: u64) -> OccupancyClass {
    let ratio_percent = if total_beds == 0 {
        0
    } else {
        let total = u128::from(total_beds);
        let rounded = (u128::from(occupied_beds) * 200 + total) / (total * 2);
        u32::try_from(rounded).unwrap_or(u32::MAX)
    };

    let severity = if ratio_percent >= CRITICAL_PERCENT {
        Severity::Critical
    } else if ratio_percent >= ELEVATED_PERCENT {
        Severity::Elevated
    } else {
        Severity::Normal
    };

    OccupancyClass {
        ratio_percent,
        severity,
    }
}

/// Pair every facility with its occupancy classification, in input order.
pub fn classify_facilities(facilities: &[FacilityRecord]) -> Vec<FacilityOccupancy> {
    facilities
        .iter()
        .map(|f| FacilityOccupancy {
            facility: f.clone(),
            occupancy: classify_occupancy(f.total_beds.into(), f.occupied_beds.into()),
        })
        .collect()
}

/// Total critical facilities across all rollups.
pub fn critical_facility_count(rollups: &[RegionRollup]) -> usize {
    rollups.iter().map(|r| r.critical_count).sum()
}

/// The `n` fullest facilities by occupancy percentage.
pub fn most_occupied(facilities: &[FacilityOccupancy], n: usize) -> Vec<&FacilityOccupancy> {
    let mut ranked: Vec<&FacilityOccupancy> = facilities
        .iter()
        .filter(|f| f.facility.total_beds > 0)
        .collect();

    ranked.sort_by(|a, b| {
        b.occupancy
            .ratio_percent
            .cmp(&a.occupancy.ratio_percent)
            .then_with(|| a.facility.name.cmp(&b.facility.name))
    });
    ranked.truncate(n);

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_REGION;

    fn facility(region: &str, total: u32, occupied: u32) -> FacilityRecord {
        FacilityRecord::new(format!("{}-{}-{}", region, total, occupied), "Test", region)
            .with_beds(total, occupied)
    }

    fn sample() -> Vec<FacilityRecord> {
        vec![
            facility("Lagos", 100, 90),
            facility("Lagos", 50, 10),
            facility("Kano", 20, 20),
        ]
    }

    #[test]
    fn test_lagos_kano_example() {
        let rollups = aggregate_by_region(&sample());

        assert_eq!(rollups.len(), 2);
        // Tied on critical_count, so region name decides.
        assert_eq!(rollups[0].region_name, "Kano");
        assert_eq!(rollups[1].region_name, "Lagos");

        assert_eq!(
            rollups[1],
            RegionRollup {
                region_name: "Lagos".to_string(),
                facility_count: 2,
                total_beds_sum: 150,
                occupied_beds_sum: 100,
                critical_count: 1,
            }
        );
        assert_eq!(
            rollups[0],
            RegionRollup {
                region_name: "Kano".to_string(),
                facility_count: 1,
                total_beds_sum: 20,
                occupied_beds_sum: 20,
                critical_count: 1,
            }
        );
    }

    #[test]
    fn test_sorted_by_critical_count() {
        let facilities = vec![
            facility("Abuja", 10, 1),
            facility("Rivers", 10, 9),
            facility("Rivers", 10, 8),
            facility("Oyo", 10, 10),
        ];

        let names: Vec<_> = aggregate_by_region(&facilities)
            .into_iter()
            .map(|r| r.region_name)
            .collect();

        assert_eq!(names, vec!["Rivers", "Oyo", "Abuja"]);
    }

    #[test]
    fn test_partition_and_sums() {
        let facilities = vec![
            facility("Lagos", 100, 90),
            facility("", 40, 4),
            facility("Kano", 0, 3),
            facility("Enugu", 7, 12),
            facility("Lagos", 13, 0),
        ];

        let rollups = aggregate_by_region(&facilities);

        let count: usize = rollups.iter().map(|r| r.facility_count).sum();
        let beds: u64 = rollups.iter().map(|r| r.total_beds_sum).sum();
        let occupied: u64 = rollups.iter().map(|r| r.occupied_beds_sum).sum();

        assert_eq!(count, facilities.len());
        assert_eq!(
            beds,
            facilities.iter().map(|f| u64::from(f.total_beds)).sum::<u64>()
        );
        assert_eq!(
            occupied,
            facilities.iter().map(|f| u64::from(f.occupied_beds)).sum::<u64>()
        );
    }

    #[test]
    fn test_critical_boundary() {
        let at = aggregate_by_region(&[facility("Lagos", 100, 80)]);
        assert_eq!(at[0].critical_count, 1);

        let below = aggregate_by_region(&[facility("Lagos", 100, 79)]);
        assert_eq!(below[0].critical_count, 0);
    }

    #[test]
    fn test_missing_region_grouped_as_unknown() {
        let rollups = aggregate_by_region(&[facility("", 10, 1)]);
        assert_eq!(rollups[0].region_name, UNKNOWN_REGION);

        let rollups = aggregate_by_region(&[facility(" ", 10, 1), facility(UNKNOWN_REGION, 4, 0)]);
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].region_name, UNKNOWN_REGION);
        assert_eq!(rollups[0].facility_count, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_region(&[]).is_empty());
    }

    #[test]
    fn test_zero_bed_facility_never_critical() {
        let rollups = aggregate_by_region(&[facility("Kano", 0, 5)]);
        assert_eq!(rollups[0].critical_count, 0);
        assert_eq!(rollups[0].occupied_beds_sum, 5);

        let class = classify_occupancy(0, 5);
        assert_eq!(class.ratio_percent, 0);
        assert_eq!(class.severity, Severity::Normal);
    }

    #[test]
    fn test_over_capacity_counts_critical() {
        let rollups = aggregate_by_region(&[facility("Kano", 10, 25)]);
        assert_eq!(rollups[0].critical_count, 1);
    }

    #[test]
    fn test_idempotent() {
        let facilities = sample();
        let first = aggregate_by_region(&facilities);
        let second = aggregate_by_region(&facilities);
        assert_eq!(first, second);
        assert_eq!(facilities, sample());
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify_occupancy(100, 80).severity, Severity::Critical);
        assert_eq!(classify_occupancy(100, 79).severity, Severity::Elevated);
        assert_eq!(classify_occupancy(100, 50).severity, Severity::Elevated);
        assert_eq!(classify_occupancy(100, 49).severity, Severity::Normal);
    }

    #[test]
    fn test_classify_rounding() {
        // 2/3 = 66.67% -> 67
        assert_eq!(classify_occupancy(3, 2).ratio_percent, 67);
        // 1/8 = 12.5% -> 13
        assert_eq!(classify_occupancy(8, 1).ratio_percent, 13);
        // 159/200 = 79.5% rounds into critical
        let class = classify_occupancy(200, 159);
        assert_eq!(class.ratio_percent, 80);
        assert_eq!(class.severity, Severity::Critical);
    }

    #[test]
    fn test_classify_not_clamped() {
        let class = classify_occupancy(20, 30);
        assert_eq!(class.ratio_percent, 150);
        assert_eq!(class.severity, Severity::Critical);
    }

    #[test]
    fn test_rollup_occupancy() {
        let rollups = aggregate_by_region(&sample());
        let lagos = rollups.iter().find(|r| r.region_name == "Lagos").unwrap();
        assert_eq!(lagos.occupancy().ratio_percent, 67);
        assert_eq!(lagos.occupancy().severity, Severity::Elevated);
    }

    #[test]
    fn test_critical_facility_count() {
        let rollups = aggregate_by_region(&sample());
        assert_eq!(critical_facility_count(&rollups), 2);
    }

    #[test]
    fn test_classify_facilities_keeps_order() {
        let classified = classify_facilities(&sample());
        assert_eq!(classified.len(), 3);
        assert_eq!(classified[0].occupancy.ratio_percent, 90);
        assert_eq!(classified[1].occupancy.ratio_percent, 20);
        assert_eq!(classified[2].occupancy.ratio_percent, 100);
    }

    #[test]
    fn test_most_occupied() {
        let mut facilities = sample();
        facilities.push(facility("Oyo", 0, 0));
        let classified = classify_facilities(&facilities);

        let top = most_occupied(&classified, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].occupancy.ratio_percent, 100);
        assert_eq!(top[1].occupancy.ratio_percent, 90);
    }
}
