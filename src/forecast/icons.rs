//! Per-provider icon and description lookup
//!
//! Which provider wins a field is an explicit preference list, independent of
//! the order points happen to arrive in.

use crate::models::{ForecastPoint, Source};
use serde::{Deserialize, Serialize};

/// Providers whose description is a readable text label, most preferred first.
/// DMI and YR only supply symbol codes and never provide the description.
pub const DESCRIPTION_PRIORITY: [Source; 2] = [Source::Owm, Source::Tv2];

/// Providers with icon assets, most preferred first
pub const ICON_PRIORITY: [Source; 2] = [Source::Dmi, Source::Yr];

/// Placeholder substituted with a provider's symbol code
pub const CODE_PLACEHOLDER: &str = "{code}";

/// URL templates turning a provider symbol code into an icon URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconSet {
    /// Template for DMI numeric symbol codes
    pub dmi: String,
    /// Template for YR symbol names (e.g. `partlycloudy_day`)
    pub yr: String,
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            dmi: "https://www.dmi.dk/assets/img/{code}.svg".to_string(),
            yr: "/va/img/yr/{code}.png".to_string(),
        }
    }
}

impl IconSet {
    /// Icon URL for a single point, `None` for providers without icon assets
    #[must_use]
    pub fn icon_url(&self, point: &ForecastPoint) -> Option<String> {
        let code = point.description.trim();
        if code.is_empty() {
            return None;
        }
        let template = match point.source {
            Source::Dmi => &self.dmi,
            Source::Yr => &self.yr,
            Source::Tv2 | Source::Owm => return None,
        };
        Some(template.replace(CODE_PLACEHOLDER, code))
    }
}

/// Readable description of a single point, `None` for symbol-code providers
#[must_use]
pub fn description(point: &ForecastPoint) -> Option<&str> {
    let text = point.description.trim();
    (DESCRIPTION_PRIORITY.contains(&point.source) && !text.is_empty()).then_some(text)
}

/// First value produced by `pick` when walking `priority`, then `entries` in order
pub fn first_by_priority<T>(
    entries: &[ForecastPoint],
    priority: &[Source],
    mut pick: impl FnMut(&ForecastPoint) -> Option<T>,
) -> Option<T> {
    priority.iter().find_map(|source| {
        entries
            .iter()
            .filter(|e| e.source == *source)
            .find_map(&mut pick)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn point(source: Source, description: &str) -> ForecastPoint {
        ForecastPoint::new(
            source,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            description,
            5,
            "N/A",
        )
    }

    #[test]
    fn test_icon_urls() {
        let icons = IconSet::default();
        assert_eq!(
            icons.icon_url(&point(Source::Dmi, "3")).as_deref(),
            Some("https://www.dmi.dk/assets/img/3.svg")
        );
        assert_eq!(
            icons.icon_url(&point(Source::Yr, "cloudy")).as_deref(),
            Some("/va/img/yr/cloudy.png")
        );
        assert_eq!(icons.icon_url(&point(Source::Owm, "light rain")), None);
        assert_eq!(icons.icon_url(&point(Source::Dmi, "")), None);
    }

    #[test]
    fn test_description_only_from_text_sources() {
        assert_eq!(description(&point(Source::Owm, "light rain")), Some("light rain"));
        assert_eq!(description(&point(Source::Tv2, "Skyet")), Some("Skyet"));
        assert_eq!(description(&point(Source::Yr, "cloudy")), None);
        assert_eq!(description(&point(Source::Dmi, "3")), None);
    }

    #[test]
    fn test_priority_beats_arrival_order() {
        let entries = vec![
            point(Source::Tv2, "Skyet"),
            point(Source::Yr, "cloudy"),
            point(Source::Owm, "overcast clouds"),
            point(Source::Dmi, "3"),
        ];
        let icons = IconSet::default();

        let picked = first_by_priority(&entries, &DESCRIPTION_PRIORITY, |e| {
            description(e).map(str::to_string)
        });
        assert_eq!(picked.as_deref(), Some("overcast clouds"));

        let icon = first_by_priority(&entries, &ICON_PRIORITY, |e| icons.icon_url(e));
        assert_eq!(icon.as_deref(), Some("https://www.dmi.dk/assets/img/3.svg"));
    }

    #[test]
    fn test_priority_falls_through_to_next_source() {
        let entries = vec![point(Source::Dmi, ""), point(Source::Yr, "rain")];
        let icons = IconSet::default();
        let icon = first_by_priority(&entries, &ICON_PRIORITY, |e| icons.icon_url(e));
        assert_eq!(icon.as_deref(), Some("/va/img/yr/rain.png"));
    }
}
