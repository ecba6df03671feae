use std::fmt;

/// One of the 16 points of the compass rose, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

const SLICE_DEGREES: f64 = 22.5;
const HALF_SLICE_DEGREES: f64 = SLICE_DEGREES / 2.0;

impl CompassPoint {
    pub const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::NNE,
        CompassPoint::NE,
        CompassPoint::ENE,
        CompassPoint::E,
        CompassPoint::ESE,
        CompassPoint::SE,
        CompassPoint::SSE,
        CompassPoint::S,
        CompassPoint::SSW,
        CompassPoint::SW,
        CompassPoint::WSW,
        CompassPoint::W,
        CompassPoint::WNW,
        CompassPoint::NW,
        CompassPoint::NNW,
    ];

    /// Bucket a wind direction in degrees.
    ///
    /// `[0, 11.25]` is north, each following 22.5° slice is the next point
    /// clockwise and everything past 348.75° wraps back to north. Values
    /// outside `[0, 360)` are normalised first; non-finite input is north.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return CompassPoint::N;
        }

        let degrees = degrees.rem_euclid(360.0);
        if degrees <= HALF_SLICE_DEGREES {
            return CompassPoint::N;
        }

        let index = ((degrees - HALF_SLICE_DEGREES) / SLICE_DEGREES) as usize + 1;
        Self::ALL.get(index).copied().unwrap_or(CompassPoint::N)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NNE => "NNE",
            CompassPoint::NE => "NE",
            CompassPoint::ENE => "ENE",
            CompassPoint::E => "E",
            CompassPoint::ESE => "ESE",
            CompassPoint::SE => "SE",
            CompassPoint::SSE => "SSE",
            CompassPoint::S => "S",
            CompassPoint::SSW => "SSW",
            CompassPoint::SW => "SW",
            CompassPoint::WSW => "WSW",
            CompassPoint::W => "W",
            CompassPoint::WNW => "WNW",
            CompassPoint::NW => "NW",
            CompassPoint::NNW => "NNW",
        }
    }

    /// Key used to look up the localised label, e.g. `wind.NNE`.
    pub fn translation_key(&self) -> String {
        format!("wind.{}", self.as_str())
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
