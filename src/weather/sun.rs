//! Sunrise and sunset from a city's coordinates

use crate::Result;
use crate::VaError;
use crate::models::{City, SunData, SunTimes};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::warn;

const FALLBACK_SUNRISE_HOUR: u32 = 6;
const FALLBACK_SUNSET_HOUR: u32 = 20;

pub fn get_sunrise_sunset(city: &City, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    solar_times(city.latitude, city.longitude, date)
}

/// Sun times for `days` consecutive days starting at `start`
pub fn sun_data(city: &City, start: NaiveDate, days: u32) -> Result<SunData> {
    let dates = (0..u64::from(days))
        .map(|offset| {
            let date = start
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| VaError::general(format!("date out of range: {start} + {offset} days")))?;
            let (sunrise, sunset) = get_sunrise_sunset(city, date)?;
            Ok(SunTimes { date, sunrise, sunset })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SunData { dates })
}

fn solar_times(latitude: f64, longitude: f64, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let Some(coordinates) = Coordinates::new(latitude, longitude) else {
        warn!("Invalid coordinates lat={}, lon={}, using approximate daylight", latitude, longitude);
        return approximate_daylight(date);
    };

    let solar_day = SolarDay::new(coordinates, date);
    let sunrise = solar_day.event_time(SolarEvent::Sunrise);
    let sunset = solar_day.event_time(SolarEvent::Sunset);

    Ok((sunrise, sunset))
}

fn approximate_daylight(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let at = |hour: u32| {
        NaiveTime::from_hms_opt(hour, 0, 0)
            .map(|time| date.and_time(time).and_utc())
            .ok_or_else(|| VaError::general(format!("invalid hour {hour}")))
    };
    Ok((at(FALLBACK_SUNRISE_HOUR)?, at(FALLBACK_SUNSET_HOUR)?))
}
