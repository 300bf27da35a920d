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

//! Slide descriptors and location types shared by every layer.
//!
//! A [`SlideDescriptor`] is a complete, renderer-independent description of one
//! full-screen frame. Its `id` is its identity: two descriptors with the same id
//! are the same slide across catalog rebuilds, even if their content differs.

use std::fmt;

/// Reference to a static asset (image path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef(String);

impl AssetRef {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display language of a data record or a bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// All languages the data store keeps records for.
    pub const ALL: [Language; 2] = [Language::English, Language::Spanish];

    /// Provider language code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Spanish => "es-US",
        }
    }

    /// Placeholder shown for missing text values.
    #[must_use]
    pub fn not_available(self) -> &'static str {
        match self {
            Language::English => "Not Available",
            Language::Spanish => "No Disponible",
        }
    }
}

/// A geographic location resolved from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub loc_id: String,
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub state: String,
    pub timezone: String,
}

impl Location {
    /// Location id used when nothing could be resolved.
    pub const DEFAULT_ID: &'static str = "DEFAULT";

    /// Placeholder location used when resolution failed.
    #[must_use]
    pub fn fallback(loc_id: impl Into<String>) -> Self {
        Self {
            loc_id: loc_id.into(),
            lat: 0.0,
            lon: 0.0,
            city: Language::English.not_available().to_string(),
            state: Language::English.not_available().to_string(),
            timezone: "America/New_York".to_string(),
        }
    }
}

/// The primary location plus up to [`LocationSet::MAX_NEARBY`] nearby ones.
///
/// Replaced wholesale on reconfiguration, never partially mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSet {
    pub primary: Location,
    pub nearby: Vec<Location>,
}

impl LocationSet {
    pub const MAX_NEARBY: usize = 8;

    /// Build a set, dropping duplicate and excess nearby entries.
    #[must_use]
    pub fn new(primary: Location, nearby: Vec<Location>) -> Self {
        let mut kept: Vec<Location> = Vec::with_capacity(Self::MAX_NEARBY);
        for loc in nearby {
            if kept.len() == Self::MAX_NEARBY {
                break;
            }
            if loc.loc_id != primary.loc_id && !kept.iter().any(|k| k.loc_id == loc.loc_id) {
                kept.push(loc);
            }
        }
        Self { primary, nearby: kept }
    }

    /// Location set used before anything has been resolved.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(Location::fallback(Location::DEFAULT_ID), Vec::new())
    }

    /// Nearby locations padded with placeholders up to `MAX_NEARBY` entries.
    #[must_use]
    pub fn padded_nearby(&self) -> Vec<Location> {
        let mut nearby = self.nearby.clone();
        while nearby.len() < Self::MAX_NEARBY {
            nearby.push(Location::fallback(format!("DEFAULT_{}", nearby.len())));
        }
        nearby
    }

    /// Iterate the primary location followed by the nearby ones.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        std::iter::once(&self.primary).chain(self.nearby.iter())
    }

    /// Resolve a role to a location, padding nearby slots with placeholders.
    #[must_use]
    pub fn resolve(&self, role: LocationRole) -> Location {
        match role {
            LocationRole::Primary => self.primary.clone(),
            LocationRole::Nearby(n) => self
                .nearby
                .get(n)
                .cloned()
                .unwrap_or_else(|| Location::fallback(format!("DEFAULT_{n}"))),
        }
    }
}

/// Which location a bound field reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationRole {
    Primary,
    /// Zero-based index into the nearby list.
    Nearby(usize),
}

/// The value a bound field displays.
///
/// Indexed variants address a forecast period, extended-forecast day, almanac
/// day or moon phase by zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    City,
    Temperature,
    Humidity,
    Pressure,
    Wind,
    WindGust,
    Condition,
    PeriodName(usize),
    Narrative(usize),
    DayName(usize),
    High(usize),
    Low(usize),
    Phrase(usize),
    DayOfWeek(usize),
    Sunrise(usize),
    Sunset(usize),
    MoonPhase(usize),
    MoonDate(usize),
}

/// Reference from a field into the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataBinding {
    pub location: LocationRole,
    pub metric: Metric,
    pub language: Language,
}

/// One text element on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub id: String,
    pub text: String,
    /// Layout class names, space separated.
    pub class_name: String,
    pub binding: Option<DataBinding>,
    pub image: Option<AssetRef>,
}

impl FieldDescriptor {
    /// A static label with no data binding.
    #[must_use]
    pub fn label(id: impl Into<String>, class_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            class_name: class_name.into(),
            binding: None,
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: AssetRef) -> Self {
        self.image = Some(image);
        self
    }
}

/// Kind of animated map carried by a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    LocalRadar,
    RegionalRadar,
    RegionalSatellite,
}

impl MapKind {
    #[must_use]
    pub fn zoom(self) -> f64 {
        match self {
            MapKind::LocalRadar => 8.7,
            MapKind::RegionalRadar | MapKind::RegionalSatellite => 5.7,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            MapKind::LocalRadar | MapKind::RegionalRadar => "radar",
            MapKind::RegionalSatellite => "sat",
        }
    }
}

/// Binding between a slide and an animated map instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MapBinding {
    pub map_id: String,
    pub kind: MapKind,
    pub center: (f64, f64),
    pub zoom: f64,
}

impl MapBinding {
    /// Map centred on `center` for the slide `slide_id`.
    #[must_use]
    pub fn new(slide_id: &str, kind: MapKind, center: (f64, f64)) -> Self {
        Self {
            map_id: format!("{slide_id}-{}-map", kind.suffix()),
            kind,
            center,
            zoom: kind.zoom(),
        }
    }
}

/// Complete description of one slide in the rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDescriptor {
    /// Stable identity across catalog rebuilds.
    pub id: String,
    pub background: AssetRef,
    /// Layers drawn over the background, bottom to top.
    pub overlay_assets: Vec<AssetRef>,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
    pub duration_secs: u32,
    pub fade_enabled: bool,
    pub map_ref: Option<MapBinding>,
    /// Narrated slide; background music is ducked while it is showing.
    pub vocal_local: bool,
}

impl SlideDescriptor {
    /// A slide with only a background, no fields and no map.
    #[must_use]
    pub fn new(id: impl Into<String>, background: AssetRef, duration_secs: u32) -> Self {
        Self {
            id: id.into(),
            background,
            overlay_assets: Vec::new(),
            title: String::new(),
            fields: Vec::new(),
            duration_secs,
            fade_enabled: true,
            map_ref: None,
            vocal_local: false,
        }
    }

    /// Current text of every field, in layout order.
    #[must_use]
    pub fn field_values(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), f.text.clone()))
            .collect()
    }

    /// Whether both descriptors draw with the same artwork and field styling.
    /// Field text is not compared.
    #[must_use]
    pub fn same_presentation(&self, other: &Self) -> bool {
        self.background == other.background
            && self.overlay_assets == other.overlay_assets
            && self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.id == b.id && a.class_name == b.class_name && a.image == b.image
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: &str) -> Location {
        Location {
            loc_id: id.to_string(),
            ..Location::fallback(id)
        }
    }

    #[test]
    fn test_location_set_caps_and_dedupes_nearby() {
        let nearby = (0..12).map(|i| loc(&format!("L{}", i % 10))).collect();
        let set = LocationSet::new(loc("P"), nearby);
        assert_eq!(set.nearby.len(), LocationSet::MAX_NEARBY);
        assert_eq!(set.nearby[0].loc_id, "L0");
        assert_eq!(set.iter().count(), 9);
    }

    #[test]
    fn test_padded_nearby_fills_placeholders() {
        let set = LocationSet::new(loc("P"), vec![loc("A"), loc("B")]);
        let padded = set.padded_nearby();
        assert_eq!(padded.len(), 8);
        assert_eq!(padded[2].loc_id, "DEFAULT_2");
        assert_eq!(padded[2].city, "Not Available");
        assert_eq!(set.resolve(LocationRole::Nearby(5)).loc_id, "DEFAULT_5");
    }

    #[test]
    fn test_map_binding_ids() {
        let radar = MapBinding::new("Core_Radar", MapKind::LocalRadar, (1.0, 2.0));
        assert_eq!(radar.map_id, "Core_Radar-radar-map");
        assert!((radar.zoom - 8.7).abs() < f64::EPSILON);

        let sat = MapBinding::new("Core_RegSat", MapKind::RegionalSatellite, (1.0, 2.0));
        assert_eq!(sat.map_id, "Core_RegSat-sat-map");
    }

    #[test]
    fn test_same_presentation_ignores_text() {
        let mut a = SlideDescriptor::new("Alert", AssetRef::new("W.png"), 10);
        a.fields.push(FieldDescriptor::label("alertSummary1", "alertSummary-W", "FLOOD WARNING"));
        let mut b = a.clone();
        b.fields[0].text = "FLOOD ADVISORY".to_string();
        assert!(a.same_presentation(&b));

        b.background = AssetRef::new("Y.png");
        assert!(!a.same_presentation(&b));

        let mut c = a.clone();
        c.fields[0].image = Some(AssetRef::new("icon.png"));
        assert!(!a.same_presentation(&c));

        let mut d = a.clone();
        d.fields[0].class_name = "alertSummary-Y".to_string();
        assert!(!a.same_presentation(&d));
    }
}
