//! Decoding of the provider's Swedish enumeration labels into stable keys.
//!
//! Labels the tables do not know decode to `UNKNOWN(<label>)` so a new
//! provider value shows up verbatim instead of breaking a poll.

use std::borrow::Cow;

const UNKNOWN_PREFIX: &str = "UNKNOWN(";

const PRECIPITATION: &[(&str, &str)] = &[
    ("Givare saknas/Fel på givare", "precipitation.error"),
    ("Lätt regn", "precipitation.light_rain"),
    ("Måttligt regn", "precipitation.moderate_rain"),
    ("Kraftigt regn", "precipitation.heavy_rain"),
    ("Lätt snöblandat regn", "precipitation.light_snow_rain"),
    ("Måttligt snöblandat regn", "precipitation.moderate_snow_rain"),
    ("Kraftigt snöblandat regn", "precipitation.heavy_snow_rain"),
    ("Lätt snöfall", "precipitation.light_snow"),
    ("Måttligt snöfall", "precipitation.moderate_snow"),
    ("Kraftigt snöfall", "precipitation.heavy_snow"),
    ("Annan nederbördstyp", "precipitation.other"),
    ("Ingen nederbörd", "precipitation.none"),
    ("Okänd nederbördstyp", "precipitation.unknown"),
];

const WIND_DIRECTION: &[(&str, &str)] = &[
    ("Öst", "wind.east"),
    ("Nordöst", "wind.nort_east"),
    ("Östsydöst", "wind.east_south_east"),
    ("Norr", "wind.north"),
    ("Nordnordöst", "wind.nort_north_east"),
    ("Nordnordväst", "wind.nort_north_west"),
    ("Nordväst", "wind.nort_west"),
    ("Söder", "wind.south"),
    ("Sydöst", "wind.south_east"),
    ("Sydsydväst", "wind.south_south_west"),
    ("Sydväst", "wind.south_west"),
    ("Väst", "wind.west"),
];

/// Precipitation type label, e.g. `Lätt snöfall` → `precipitation.light_snow`.
pub fn decode_precipitation(label: &str) -> Cow<'static, str> {
    decode(PRECIPITATION, label)
}

/// Wind direction label, e.g. `Sydväst` → `wind.south_west`.
pub fn decode_wind_direction(label: &str) -> Cow<'static, str> {
    decode(WIND_DIRECTION, label)
}

pub fn is_unknown(decoded: &str) -> bool {
    decoded.starts_with(UNKNOWN_PREFIX) && decoded.ends_with(')')
}

fn decode(table: &[(&str, &'static str)], label: &str) -> Cow<'static, str> {
    if let Some((_, key)) = table.iter().find(|(known, _)| *known == label) {
        return Cow::Borrowed(*key);
    }

    if is_unknown(label) {
        Cow::Owned(label.to_owned())
    } else {
        Cow::Owned(format!("{UNKNOWN_PREFIX}{label})"))
    }
}
