use chrono_tz::Tz as ChronoTz;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

/// Wrapper type for chrono_tz::Tz so we can use doku to generate example config files
///
/// Feed dates carry no zone of their own, so every wall-clock value read from the feed is
/// interpreted in this zone and every time shown on the display is formatted in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigTimeZone(pub ChronoTz);

impl ConfigTimeZone {
    pub fn timezone(&self) -> ChronoTz {
        self.0
    }
}

impl Default for ConfigTimeZone {
    fn default() -> Self {
        ConfigTimeZone(ChronoTz::America__Chicago)
    }
}

impl Deref for ConfigTimeZone {
    type Target = ChronoTz;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ConfigTimeZone> for ChronoTz {
    fn from(value: ConfigTimeZone) -> Self {
        value.0
    }
}

impl fmt::Display for ConfigTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name())
    }
}

impl doku::Document for ConfigTimeZone {
    fn ty() -> doku::Type {
        doku::Type::from(doku::TypeKind::String)
    }
}
