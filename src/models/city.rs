//! Supported cities and their provider identifiers

use super::Source;
use crate::{Result, VaError};
use serde::Serialize;

/// A city the providers can be queried for
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    /// Registry key, upper case (e.g. `KØBENHAVN`)
    pub name: &'static str,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// GeoNames id, used by DMI and TV2 to address a location
    pub geonames_id: u32,
}

const CITIES: [City; 6] = [
    City::new("ODENSE", 55.3959, 10.3883, 2_615_876),
    City::new("AARHUS", 56.1567, 10.2108, 2_624_652),
    City::new("KØBENHAVN", 55.6759, 12.5655, 2_618_425),
    City::new("ESBJERG", 55.4667, 8.45, 2_622_447),
    City::new("AALBORG", 57.048, 9.9187, 2_624_886),
    City::new("SVENDBORG", 55.0598, 10.6068, 2_612_045),
];

/// Alternative spellings accepted on input
const ALIASES: [(&str, &str); 3] = [
    ("KOBENHAVN", "KØBENHAVN"),
    ("KOEBENHAVN", "KØBENHAVN"),
    ("COPENHAGEN", "KØBENHAVN"),
];

impl City {
    const fn new(name: &'static str, latitude: f64, longitude: f64, geonames_id: u32) -> Self {
        Self {
            name,
            latitude,
            longitude,
            geonames_id,
        }
    }

    /// Every supported city, in registry order
    #[must_use]
    pub fn all() -> &'static [City] {
        &CITIES
    }

    /// Look up a city by name, ignoring case and accepting ASCII spellings
    pub fn find(name: &str) -> Result<City> {
        let wanted = name.trim().to_uppercase();
        let wanted = ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map_or(wanted.as_str(), |(_, canonical)| *canonical);

        CITIES
            .iter()
            .find(|c| c.name == wanted)
            .copied()
            .ok_or_else(|| VaError::unknown_city(name))
    }

    /// Name for display: first letter upper case, the rest lower case
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Cache key for one provider's raw response for this city
    #[must_use]
    pub fn cache_key(&self, source: Source) -> String {
        format!("{source}:{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Odense", "ODENSE")]
    #[case("aarhus", "AARHUS")]
    #[case("københavn", "KØBENHAVN")]
    #[case("Copenhagen", "KØBENHAVN")]
    #[case("  svendborg ", "SVENDBORG")]
    fn test_find_city(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(City::find(input).unwrap().name, expected);
    }

    #[test]
    fn test_unknown_city() {
        let err = City::find("Gotham").unwrap_err();
        assert!(matches!(err, VaError::UnknownCity { .. }));
    }

    #[test]
    fn test_display_name() {
        let names: Vec<String> = City::all().iter().map(City::display_name).collect();
        assert_eq!(
            names,
            vec!["Odense", "Aarhus", "København", "Esbjerg", "Aalborg", "Svendborg"]
        );
    }

    #[test]
    fn test_city_cache_key() {
        let city = City::find("odense").unwrap();
        assert_eq!(city.cache_key(Source::Dmi), "dmi:ODENSE");
    }
}
