//! Markdown and JSON report generation.
//!
//! The Markdown report mirrors the dashboard: overview cards, the
//! national analytics table, the fullest facilities, the facility list,
//! the map markers and, when requested, one facility's detail view.

use crate::models::{
    FacilityDetail, FacilityOccupancy, OccupancyClass, Overview, RegionRollup, Report,
    ReportMetadata,
};
use anyhow::Result;
use std::path::Path;

/// Width of the occupancy gauge in characters.
const GAUGE_WIDTH: u32 = 10;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Health Intel Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_overview_section(&report.overview));
    output.push_str(&generate_regions_section(&report.regions));
    output.push_str(&generate_most_occupied_section(&report.most_occupied));
    output.push_str(&generate_facilities_section(&report.facilities));
    output.push_str(&generate_markers_section(report));
    if let Some(ref detail) = report.detail {
        output.push_str(&generate_detail_section(detail));
    }
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Facilities Loaded:** {}\n",
        metadata.facilities_loaded
    ));
    if metadata.facilities_reported != metadata.facilities_loaded {
        section.push_str(&format!(
            "- **Facilities Reported:** {} ({})\n",
            metadata.facilities_reported, metadata.filter
        ));
    }
    section.push('\n');

    section
}

/// Generate the overview cards.
fn generate_overview_section(overview: &Overview) -> String {
    let mut section = String::new();
    let occupancy = overview.occupancy();

    section.push_str("## National Overview\n\n");
    section.push_str("| Total Facilities | Public | Private | Beds | Occupied | Occupancy | Critical Alerts |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} {}% | **{}** |\n\n",
        overview.total_facilities,
        overview.public_facilities,
        overview.private_facilities,
        overview.total_beds,
        overview.occupied_beds,
        occupancy.severity.emoji(),
        occupancy.ratio_percent,
        overview.critical_facilities
    ));

    section
}

/// Generate the per-state analytics table.
fn generate_regions_section(regions: &[RegionRollup]) -> String {
    let mut section = String::new();

    section.push_str("## Regional Analytics\n\n");

    if regions.is_empty() {
        section.push_str("No facilities to aggregate.\n\n");
        return section;
    }

    section.push_str("| State | Facilities | Capacity (Beds) | Avg. Occupancy | Critical Alerts |\n");
    section.push_str("|:---|:---:|:---:|:---|:---:|\n");

    for region in regions {
        let critical = if region.critical_count > 0 {
            format!("🔴 {} Hospitals", region.critical_count)
        } else {
            "Normal".to_string()
        };

        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(&region.region_name),
            region.facility_count,
            region.total_beds_sum,
            format_occupancy(&region.occupancy()),
            critical
        ));
    }
    section.push('\n');

    section
}

/// Generate the fullest facilities list.
fn generate_most_occupied_section(facilities: &[FacilityOccupancy]) -> String {
    if facilities.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Fullest Facilities\n\n");
    for (i, entry) in facilities.iter().enumerate() {
        section.push_str(&format!(
            "{}. {} **{}** ({}) - {}% ({} of {} beds)\n",
            i + 1,
            entry.occupancy.severity.emoji(),
            entry.facility.name,
            entry.facility.region_key(),
            entry.occupancy.ratio_percent,
            entry.facility.occupied_beds,
            entry.facility.total_beds
        ));
    }
    section.push('\n');

    section
}

/// Generate the facility list.
fn generate_facilities_section(facilities: &[FacilityOccupancy]) -> String {
    if facilities.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Facilities\n\n");
    section.push_str("| Facility | Type | State | Beds | Occupancy | Status | Capabilities |\n");
    section.push_str("|:---|:---:|:---|:---:|:---|:---:|:---|\n");

    for entry in facilities {
        let facility = &entry.facility;
        let capabilities = facility.capabilities.labels();
        let status = if facility.is_active { "Active" } else { "Inactive" };

        section.push_str(&format!(
            "| {} | {} | {} | {} / {} | {} | {} | {} |\n",
            escape_cell(&facility.name),
            facility.facility_type,
            escape_cell(facility.region_key()),
            facility.occupied_beds,
            facility.total_beds,
            format_occupancy(&entry.occupancy),
            status,
            if capabilities.is_empty() {
                "-".to_string()
            } else {
                capabilities.join(", ")
            }
        ));
    }
    section.push('\n');

    section
}

/// Generate the map marker table.
fn generate_markers_section(report: &Report) -> String {
    if report.markers.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Map Markers\n\n");
    section.push_str("| Facility | Location | Coordinates | Marker | Capacity |\n");
    section.push_str("|:---|:---|:---:|:---:|:---|\n");

    for marker in &report.markers {
        section.push_str(&format!(
            "| {} | {} | {:.4}, {:.4} | {} | {} ({} beds) |\n",
            escape_cell(&marker.name),
            escape_cell(&marker.place),
            marker.position.latitude,
            marker.position.longitude,
            marker.kind,
            marker.capacity.color(),
            marker.total_beds
        ));
    }

    let unplaced = report.facilities.len().saturating_sub(report.markers.len());
    if !report.facilities.is_empty() && unplaced > 0 {
        section.push_str(&format!(
            "\n*{} facilities have no coordinates and are not shown on the map.*\n",
            unplaced
        ));
    }
    section.push('\n');

    section
}

/// Generate the detail view of a single facility.
fn generate_detail_section(detail: &FacilityDetail) -> String {
    let mut section = String::new();
    let facility = &detail.facility;

    let place = match facility.city.as_deref() {
        Some(city) => format!("{}, {}", city, facility.region_key()),
        None => facility.region_key().to_string(),
    };

    section.push_str(&format!("## Facility Detail: {}\n\n", facility.name));
    section.push_str(&format!("- **Facility ID:** `{}`\n", facility.id));
    section.push_str(&format!("- **Location:** {}\n", place));
    section.push_str(&format!("- **Type:** {}\n", facility.facility_type));
    section.push_str(&format!(
        "- **Beds:** {} of {} occupied, {}\n",
        facility.occupied_beds,
        facility.total_beds,
        format_occupancy(&detail.occupancy())
    ));
    section.push_str(&format!(
        "- **Staff:** {} ({} doctors and nurses)\n",
        detail.staff.len(),
        detail.medical_staff_count()
    ));
    section.push_str(&format!("- **Departments:** {}\n\n", detail.departments.len()));

    section.push_str("### Departments\n\n");
    if detail.departments.is_empty() {
        section.push_str("No departments found.\n\n");
    } else {
        section.push_str("| Department Name | Type |\n");
        section.push_str("|:---|:---:|\n");
        for department in &detail.departments {
            section.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&department.name),
                escape_cell(&department.department_type)
            ));
        }
        section.push('\n');
    }

    section.push_str("### Staff\n\n");
    if detail.staff.is_empty() {
        section.push_str("No staff registered.\n\n");
    } else {
        section.push_str("| Name | Role | Email | Status |\n");
        section.push_str("|:---|:---:|:---|:---:|\n");
        for member in &detail.staff {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&member.full_name()),
                escape_cell(&member.role),
                escape_cell(member.email.as_deref().unwrap_or("-")),
                if member.is_active { "Active" } else { "Inactive" }
            ));
        }
        section.push('\n');
    }

    section
}

/// Make text safe inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by Health Intel*\n".to_string()
}

/// Render an occupancy class as a gauge plus the unclamped percentage.
fn format_occupancy(occupancy: &OccupancyClass) -> String {
    let filled = (occupancy.gauge_percent() * GAUGE_WIDTH + 50) / 100;
    let gauge: String = (0..GAUGE_WIDTH)
        .map(|i| if i < filled { '█' } else { '░' })
        .collect();

    let mut text = format!(
        "{} `{}` {}%",
        occupancy.severity.emoji(),
        gauge,
        occupancy.ratio_percent
    );
    if occupancy.is_over_capacity() {
        text.push_str(" (over capacity)");
    }
    text
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write already-rendered report content to a file, or stdout for `-`.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if path == Path::new("-") {
        println!("{}", content);
        return Ok(());
    }

    std::fs::write(path, content)?;
    Ok(())
}
