//! Weather providers known to the aggregator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One upstream weather provider.
///
/// The declaration order is the canonical iteration order used everywhere a
/// series is walked (`tv2`, `dmi`, `yr`, `owm`), so derived `Ord` doubles as
/// the key order of a [`super::ForecastSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// TV2 Vejr (broadcaster site)
    Tv2,
    /// Danish Meteorological Institute
    Dmi,
    /// Yr / MET Norway locationforecast API
    Yr,
    /// OpenWeatherMap
    Owm,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Tv2, Source::Dmi, Source::Yr, Source::Owm];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Tv2 => "tv2",
            Source::Dmi => "dmi",
            Source::Yr => "yr",
            Source::Owm => "owm",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tv2" => Ok(Source::Tv2),
            "dmi" => Ok(Source::Dmi),
            "yr" => Ok(Source::Yr),
            "owm" => Ok(Source::Owm),
            other => Err(format!("unknown weather source '{other}'")),
        }
    }
}
