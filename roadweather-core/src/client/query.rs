//! Request bodies in the Trafikinfo XML query language.
//!
//! ```xml
//! <REQUEST>
//!   <LOGIN authenticationkey='...'/>
//!   <QUERY objecttype='WeatherMeasurepoint' schemaversion='2.1'>
//!     <FILTER><EQ name='Id' value='1211' /></FILTER>
//!     <INCLUDE>Name</INCLUDE>
//!   </QUERY>
//! </REQUEST>
//! ```

use std::fmt::Write;

pub const MEASUREPOINT_OBJECT: &str = "WeatherMeasurepoint";
pub const MEASUREPOINT_SCHEMA: &str = "2.1";
pub const CAMERA_OBJECT: &str = "Camera";
pub const CAMERA_SCHEMA: &str = "1";

const STATION_FIELDS: [&str; 3] = ["Id", "Name", "Geometry.WGS84"];

/// A single filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq {
        name: String,
        value: String,
    },
    /// Regex-style match, `^prefix` for prefix search.
    Like {
        name: String,
        value: String,
    },
    /// Points within `radius_meters` of (`longitude`, `latitude`).
    Within {
        name: String,
        longitude: f64,
        latitude: f64,
        radius_meters: u32,
    },
}

impl Filter {
    fn write_xml(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Filter::Eq { name, value } => {
                write!(out, "<EQ name='{}' value='{}' />", escape(name), escape(value))
            }
            Filter::Like { name, value } => {
                write!(out, "<LIKE name='{}' value='{}' />", escape(name), escape(value))
            }
            // The provider reads the center as "longitude latitude".
            Filter::Within {
                name,
                longitude,
                latitude,
                radius_meters,
            } => write!(
                out,
                "<WITHIN name='{}' shape='center' value='{longitude} {latitude}' radius='{radius_meters}m' />",
                escape(name)
            ),
        };
    }
}

/// One `QUERY` element: object type, schema version, filter and field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub object_type: String,
    pub schema_version: String,
    pub filter: Option<Filter>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Query {
    pub fn new(object_type: impl Into<String>, schema_version: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            schema_version: schema_version.into(),
            filter: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Stations whose name starts with `prefix`.
    pub fn stations_by_name(prefix: &str) -> Self {
        Self::new(MEASUREPOINT_OBJECT, MEASUREPOINT_SCHEMA)
            .filter(Filter::Like {
                name: "Name".into(),
                value: format!("^{prefix}"),
            })
            .include(STATION_FIELDS)
    }

    /// Stations within `radius_meters` of a position.
    pub fn stations_by_location(latitude: f64, longitude: f64, radius_meters: u32) -> Self {
        Self::new(MEASUREPOINT_OBJECT, MEASUREPOINT_SCHEMA)
            .filter(Filter::Within {
                name: "Geometry.WGS84".into(),
                longitude,
                latitude,
                radius_meters,
            })
            .include(STATION_FIELDS)
    }

    /// Full observation of one station, minus the 5 and 10 minute aggregates.
    pub fn station_observation(station_id: &str) -> Self {
        Self::new(MEASUREPOINT_OBJECT, MEASUREPOINT_SCHEMA)
            .filter(Filter::Eq {
                name: "Id".into(),
                value: station_id.into(),
            })
            .include(STATION_FIELDS)
            .include(["Observation", "ModifiedTime"])
            .exclude([
                "Observation.Aggregated5minutes",
                "Observation.Aggregated10minutes",
            ])
    }

    /// Cameras whose name starts with the station name.
    pub fn cameras_by_name(station_name: &str) -> Self {
        Self::new(CAMERA_OBJECT, CAMERA_SCHEMA)
            .filter(Filter::Like {
                name: "Name".into(),
                value: format!("^{station_name}"),
            })
            .include(["Id", "Name", "PhotoUrl", "HasFullSizePhoto"])
    }

    /// Complete request document authenticated with `token`.
    pub fn to_request_xml(&self, token: &str) -> String {
        let mut out = String::with_capacity(256);
        let _ = write!(
            out,
            "<REQUEST><LOGIN authenticationkey='{}'/><QUERY objecttype='{}' schemaversion='{}'>",
            escape(token),
            escape(&self.object_type),
            escape(&self.schema_version),
        );

        if let Some(filter) = &self.filter {
            out.push_str("<FILTER>");
            filter.write_xml(&mut out);
            out.push_str("</FILTER>");
        }
        for field in &self.include {
            let _ = write!(out, "<INCLUDE>{}</INCLUDE>", escape(field));
        }
        for field in &self.exclude {
            let _ = write!(out, "<EXCLUDE>{}</EXCLUDE>", escape(field));
        }

        out.push_str("</QUERY></REQUEST>");
        out
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
