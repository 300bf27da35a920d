// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Content packages.
//!
//! A package is a fixed list of slide templates. Templates are rendered with
//! the package's language and label set, so a Spanish package is the same
//! template list as any other, only with different data.

use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;
use crate::model::{Language, LocationSet, MapKind};

/// A named bundle of slides enabled by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Package {
    Core,
    MiniCore,
    ExtraLocal,
    Spanish,
}

/// Slide layouts a package can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Template {
    /// Teaser listing every enabled package.
    UpNext,
    /// Animated map slide; the name becomes the slide id suffix.
    Map { name: &'static str, kind: MapKind },
    Now,
    /// Nearby conditions, four locations per page.
    Nearby { page: usize },
    /// One period of the 36-hour forecast.
    ThirtySixHour { period: usize },
    Extended,
    Almanac,
}

const LOCAL_RADAR: Template = Template::Map {
    name: "Radar",
    kind: MapKind::LocalRadar,
};

const CORE: &[Template] = &[
    Template::UpNext,
    LOCAL_RADAR,
    Template::Now,
    Template::Nearby { page: 0 },
    Template::Nearby { page: 1 },
    Template::Map {
        name: "Radar2",
        kind: MapKind::LocalRadar,
    },
    Template::ThirtySixHour { period: 0 },
    Template::ThirtySixHour { period: 1 },
    Template::ThirtySixHour { period: 2 },
    Template::Extended,
    Template::Almanac,
    Template::Map {
        name: "RegSat",
        kind: MapKind::RegionalSatellite,
    },
    Template::Map {
        name: "RegRad",
        kind: MapKind::RegionalRadar,
    },
    Template::Map {
        name: "Radar3",
        kind: MapKind::LocalRadar,
    },
];

const MINI_CORE: &[Template] = &[
    Template::UpNext,
    LOCAL_RADAR,
    Template::Now,
    Template::ThirtySixHour { period: 0 },
    Template::ThirtySixHour { period: 1 },
    Template::ThirtySixHour { period: 2 },
    Template::Extended,
    Template::Map {
        name: "Radar2",
        kind: MapKind::LocalRadar,
    },
];

const EXTRA_LOCAL: &[Template] = &[
    Template::UpNext,
    Template::Now,
    Template::ThirtySixHour { period: 0 },
    Template::ThirtySixHour { period: 1 },
    Template::ThirtySixHour { period: 2 },
    Template::Extended,
];

const SPANISH: &[Template] = &[
    Template::UpNext,
    Template::Now,
    Template::Nearby { page: 0 },
    Template::Nearby { page: 1 },
    Template::Extended,
    Template::Almanac,
];

impl Package {
    pub const ALL: [Package; 4] = [
        Package::Core,
        Package::MiniCore,
        Package::ExtraLocal,
        Package::Spanish,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Package::Core => "Core",
            Package::MiniCore => "MiniCore",
            Package::ExtraLocal => "ExtraLocal",
            Package::Spanish => "Spanish",
        }
    }

    /// Title shown in the Up Next teaser.
    #[must_use]
    pub fn title(self, locations: &LocationSet) -> String {
        match self {
            Package::Core | Package::MiniCore => "Your Local Forecast".to_string(),
            Package::ExtraLocal => format!("Forecast for {}", locations.primary.city),
            Package::Spanish => "Spanish Forecast".to_string(),
        }
    }

    #[must_use]
    pub fn language(self) -> Language {
        match self {
            Package::Spanish => Language::Spanish,
            _ => Language::English,
        }
    }

    /// Narrated slides are only recorded in English.
    pub(crate) fn narrated(self) -> bool {
        self.language() == Language::English
    }

    pub(crate) fn templates(self) -> &'static [Template] {
        match self {
            Package::Core => CORE,
            Package::MiniCore => MINI_CORE,
            Package::ExtraLocal => EXTRA_LOCAL,
            Package::Spanish => SPANISH,
        }
    }

    /// Directory holding this package's background artwork.
    pub(crate) fn background_dir(self, locale: &str) -> String {
        match self {
            Package::Spanish => format!("./images/background/packages/{}", self.name()),
            _ => format!("./images/background/{locale}"),
        }
    }

    /// Parse an ordered list of package names, rejecting unknown or repeated ones.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Package>, CatalogError> {
        let mut packages = Vec::with_capacity(names.len());
        for name in names {
            let package: Package = name.as_ref().parse()?;
            if !packages.contains(&package) {
                packages.push(package);
            }
        }
        if packages.is_empty() {
            return Err(CatalogError::NoPackages);
        }
        Ok(packages)
    }
}

impl FromStr for Package {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Package::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::UnknownPackage(s.to_string()))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed text printed on slides, per language.
#[derive(Debug)]
pub(crate) struct Labels {
    pub up_next: &'static str,
    pub current_conditions: &'static str,
    pub thirty_six_hour: &'static str,
    pub extended: &'static str,
    pub almanac: &'static str,
    pub local_doppler: &'static str,
    pub regional_doppler: &'static str,
    pub regional_satellite: &'static str,
    pub temp: &'static str,
    pub wind: &'static str,
    pub sunrise: &'static str,
    pub sunset: &'static str,
    pub nws: &'static str,
}

const ENGLISH: Labels = Labels {
    up_next: "Up Next...",
    current_conditions: "Current Conditions",
    thirty_six_hour: "36 Hour Forecast",
    extended: "Extended Forecast",
    almanac: "Almanac",
    local_doppler: "Local Doppler",
    regional_doppler: "Regional Doppler",
    regional_satellite: "Regional Satellite",
    temp: "TEMP",
    wind: "WIND",
    sunrise: "Sunrise",
    sunset: "Sunset",
    nws: "National Weather Service",
};

const SPANISH_LABELS: Labels = Labels {
    up_next: "Up Next...",
    current_conditions: "Condiciones Actuales",
    thirty_six_hour: "Pronóstico de 36 Horas",
    extended: "Pronóstico Extendido",
    almanac: "Almanaque",
    local_doppler: "Doppler Local",
    regional_doppler: "Doppler Regional",
    regional_satellite: "Satélite Regional",
    temp: "TEMP",
    wind: "VIENTO",
    sunrise: "Salida",
    sunset: "Puesta",
    nws: "Servicio Nacional de Meteorología",
};

pub(crate) fn labels(language: Language) -> &'static Labels {
    match language {
        Language::English => &ENGLISH,
        Language::Spanish => &SPANISH_LABELS,
    }
}
