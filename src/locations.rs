use std::path::Path;

use anyhow::{Context as _, Result};

/// One data row from the locations file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub state: String,
    pub city: String,
    pub postal: String,
}

/// The rotation table. Only data rows are stored; the header row is
/// dropped at load time so rotation is plain modular arithmetic.
#[derive(Debug, Default)]
pub struct LocationTable {
    rows: Vec<Location>,
}

/// Zero-pads a postal code on the left to at least 5 characters.
pub fn zfill5(postal: &str) -> String {
    format!("{:0>5}", postal)
}

impl LocationTable {
    /// Reads the whole table into memory, replacing any previous contents.
    /// A missing file is a hard error; the tool is useless without it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading location table {}", path.display()))?;

        let mut rows = Vec::new();
        // First line is the header.
        for line in table_str.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(',').map(str::trim);
            let (Some(state), Some(city), Some(postal)) =
                (fields.next(), fields.next(), fields.next())
            else {
                log::warn!("Skipping malformed location row: {line}");
                continue;
            };
            rows.push(Location {
                state: state.to_string(),
                city: city.to_string(),
                postal: postal.to_string(),
            });
        }

        log::debug!("Loaded {} locations from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    /// Finds the row matching `target_postal` and returns the row after it,
    /// wrapping from the last row back to the first. The target is matched
    /// against every field of the row, the way the source table is keyed.
    /// Returns `None` when the postal code is not in the table.
    pub fn next_after(&self, target_postal: &str) -> Option<&Location> {
        let target = zfill5(target_postal);
        let Some(index) = self
            .rows
            .iter()
            .position(|row| row.state == target || row.city == target || row.postal == target)
        else {
            log::warn!("Postal code {target} is not in the location table");
            return None;
        };
        Some(&self.rows[(index + 1) % self.rows.len()])
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<Location>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str, city: &str, postal: &str) -> Location {
        Location {
            state: state.to_string(),
            city: city.to_string(),
            postal: postal.to_string(),
        }
    }

    fn albany_troy() -> LocationTable {
        LocationTable::from_rows(vec![row("NY", "Albany", "12201"), row("NY", "Troy", "12180")])
    }

    #[test]
    fn zfill_pads_short_codes() {
        assert_eq!(zfill5("501"), "00501");
        assert_eq!(zfill5("12180"), "12180");
        assert_eq!(zfill5(""), "00000");
    }

    #[test]
    fn next_is_the_following_row() {
        let table = albany_troy();
        assert_eq!(table.next_after("12201"), Some(&row("NY", "Troy", "12180")));
    }

    #[test]
    fn last_row_wraps_to_first_data_row() {
        let table = albany_troy();
        assert_eq!(
            table.next_after("12180"),
            Some(&row("NY", "Albany", "12201")),
        );
    }

    #[test]
    fn short_target_is_padded_before_lookup() {
        let table = LocationTable::from_rows(vec![
            row("NY", "Holtsville", "00501"),
            row("NY", "Albany", "12201"),
        ]);
        assert_eq!(table.next_after("501"), Some(&row("NY", "Albany", "12201")));
    }

    #[test]
    fn unknown_postal_is_none() {
        let table = albany_troy();
        assert_eq!(table.next_after("99999"), None);
        assert_eq!(LocationTable::default().next_after("12201"), None);
    }

    #[test]
    fn load_skips_header_and_blank_lines() {
        let path = std::env::temp_dir().join(format!(
            "rotate_a_job_locations_{}.csv",
            std::process::id(),
        ));
        std::fs::write(&path, "usState,usCity,usPostalCode\nNY,Albany,12201\n\nNY,Troy,12180\n")
            .unwrap();

        let table = LocationTable::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // The header never participates in rotation.
        assert_eq!(table.next_after("usPostalCode"), None);
        assert_eq!(
            table.next_after("12180"),
            Some(&row("NY", "Albany", "12201")),
        );
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(LocationTable::load("no/such/table.csv").is_err());
    }
}
