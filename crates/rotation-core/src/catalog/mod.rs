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

//! Slide catalog.
//!
//! Turns the enabled packages and a data snapshot into the ordered list of
//! slide descriptors handed to the rotator. Rebuilding is pure: the same
//! snapshot and package list always give the same ids and the same content.

pub mod fields;
pub mod packages;

pub use fields::resolve;
pub use packages::Package;

use log::debug;

use crate::error::CatalogError;
use crate::model::{
    AssetRef, DataBinding, FieldDescriptor, Language, LocationRole, MapBinding, MapKind, Metric,
    SlideDescriptor,
};
use crate::store::Snapshot;
use packages::{labels, Labels, Template};

/// Id of the recurring splash slide, the rotation's safe point.
pub const SPLASH_ID: &str = "Splash";

/// Id of the loading placeholder that opens the rotation.
pub const UPGRADING_ID: &str = "Upgrading";

pub const AFFILIATE_ID: &str = "Affiliate";

const PRODUCT_OVERLAY: &str = "./images/Plus_Product.png";
const NEARBY_PER_PAGE: usize = 4;
const EXTENDED_DAYS: usize = 5;

/// The fixed slides that open every rotation.
#[must_use]
pub fn lead_in_slides(affiliate_name: &str) -> Vec<SlideDescriptor> {
    let mut upgrading =
        SlideDescriptor::new(UPGRADING_ID, AssetRef::new("./images/Plus_Upgrade.png"), 0);
    upgrading.fade_enabled = false;

    let mut splash = SlideDescriptor::new(SPLASH_ID, AssetRef::new("./images/Plus_Splash.png"), 10);
    splash.fade_enabled = false;

    let mut affiliate =
        SlideDescriptor::new(AFFILIATE_ID, AssetRef::new("./images/Plus_Affiliate.png"), 10);
    affiliate.fields = vec![
        FieldDescriptor::label("affiliateName", "affiliateName", affiliate_name),
        FieldDescriptor::label(
            "genericText",
            "genericText",
            "Your Source for Weatherscan Local",
        ),
    ];

    vec![upgrading, splash, affiliate]
}

/// Builds slide descriptors from packages and data.
#[derive(Debug, Clone)]
pub struct SlideCatalog {
    locale: String,
}

impl SlideCatalog {
    /// A catalog drawing backgrounds from the `locale` artwork set.
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Produce the package slides, in package order, for `snapshot`.
    pub fn rebuild(
        &self,
        snapshot: &Snapshot,
        packages: &[Package],
    ) -> Result<Vec<SlideDescriptor>, CatalogError> {
        if packages.is_empty() {
            return Err(CatalogError::NoPackages);
        }
        if snapshot.locations.primary.loc_id.is_empty() {
            return Err(CatalogError::MissingLocation("primary".to_string()));
        }

        let mut slides = Vec::new();
        for &package in packages {
            let builder = Builder {
                package,
                language: package.language(),
                labels: labels(package.language()),
                background_dir: package.background_dir(&self.locale),
                snapshot,
                enabled: packages,
            };
            slides.extend(package.templates().iter().map(|t| builder.build(*t)));
        }

        debug!(
            "Catalog rebuilt: {} slides from {} packages (generation {})",
            slides.len(),
            packages.len(),
            snapshot.generation
        );
        Ok(slides)
    }
}

struct Builder<'a> {
    package: Package,
    language: Language,
    labels: &'static Labels,
    background_dir: String,
    snapshot: &'a Snapshot,
    enabled: &'a [Package],
}

impl Builder<'_> {
    fn build(&self, template: Template) -> SlideDescriptor {
        match template {
            Template::UpNext => self.up_next(),
            Template::Map { name, kind } => self.map(name, kind),
            Template::Now => self.now(),
            Template::Nearby { page } => self.nearby(page),
            Template::ThirtySixHour { period } => self.thirty_six_hour(period),
            Template::Extended => self.extended(),
            Template::Almanac => self.almanac(),
        }
    }

    fn slide(&self, name: &str, background: &str, title: &str, duration_secs: u32) -> SlideDescriptor {
        let mut slide = SlideDescriptor::new(
            format!("{}_{name}", self.package),
            AssetRef::new(format!("{}/{background}", self.background_dir)),
            duration_secs,
        );
        slide.title = title.to_string();
        slide.overlay_assets = vec![AssetRef::new(PRODUCT_OVERLAY)];
        slide
    }

    fn field_id(&self, name: &str) -> String {
        format!("{}_{name}", self.package)
    }

    fn label(&self, name: &str, class_name: &str, text: &str) -> FieldDescriptor {
        FieldDescriptor::label(self.field_id(name), class_name, text)
    }

    fn bound(&self, name: &str, class_name: &str, location: LocationRole, metric: Metric) -> FieldDescriptor {
        let binding = DataBinding {
            location,
            metric,
            language: self.language,
        };
        FieldDescriptor {
            id: self.field_id(name),
            text: resolve(&binding, self.snapshot),
            class_name: class_name.to_string(),
            binding: Some(binding),
            image: None,
        }
    }

    fn with_icon(&self, field: FieldDescriptor) -> FieldDescriptor {
        match field.binding {
            Some(binding) => {
                let icon = fields::icon_code(&binding, self.snapshot);
                field.with_image(AssetRef::new(format!("./images/wxicons/{icon}.png")))
            }
            None => field,
        }
    }

    fn up_next(&self) -> SlideDescriptor {
        let mut slide = self.slide("UpNext", "upnext.png", self.labels.up_next, 6);
        slide.fade_enabled = false;
        slide.overlay_assets = vec![AssetRef::new("./images/Plus_UpNext.png")];
        slide.fields = self
            .enabled
            .iter()
            .map(|&package| {
                let class_name = if package == self.package {
                    "upnext_item upnext_item-current"
                } else {
                    "upnext_item"
                };
                let name = format!("upnext_{}", package.name().to_lowercase());
                self.label(&name, class_name, &package.title(&self.snapshot.locations))
            })
            .collect();
        slide
    }

    fn map(&self, name: &str, kind: MapKind) -> SlideDescriptor {
        let (background, title) = match kind {
            MapKind::LocalRadar => ("nearby.png", self.labels.local_doppler),
            MapKind::RegionalRadar => ("almanac.png", self.labels.regional_doppler),
            MapKind::RegionalSatellite => ("almanac.png", self.labels.regional_satellite),
        };
        let mut slide = self.slide(name, background, title, 20);
        slide.fade_enabled = false;
        let primary = &self.snapshot.locations.primary;
        slide.map_ref = Some(MapBinding::new(&slide.id, kind, (primary.lat, primary.lon)));
        slide.fields = vec![self.label("radarMapContainer", "map-container", "")];
        slide
    }

    fn now(&self) -> SlideDescriptor {
        let mut slide = self.slide("Now", "now.png", self.labels.current_conditions, 10);
        slide.fade_enabled = false;
        slide.vocal_local = self.package.narrated();
        let primary = LocationRole::Primary;
        slide.fields = vec![
            self.bound("nowCity", "city", primary, Metric::City),
            self.bound("nowHumidity", "humidity", primary, Metric::Humidity),
            self.bound("nowPressure", "pressure", primary, Metric::Pressure),
            self.bound("nowWind", "wind", primary, Metric::Wind),
            self.bound("nowGusts", "gusts", primary, Metric::WindGust),
            self.bound("nowTemperature", "temperature", primary, Metric::Temperature),
            self.with_icon(self.bound("nowCondition", "condition", primary, Metric::Condition)),
        ];
        slide
    }

    fn nearby(&self, page: usize) -> SlideDescriptor {
        let name = format!("Nearby{}", page + 1);
        let mut slide = self.slide(&name, "nearby.png", self.labels.current_conditions, 10);
        slide.fields = vec![
            self.label("nearTempLabel", "tempLabel", self.labels.temp),
            self.label("nearWindLabel", "windLabel", self.labels.wind),
        ];
        for row in 0..NEARBY_PER_PAGE {
            let index = page * NEARBY_PER_PAGE + row;
            let role = LocationRole::Nearby(index);
            let n = index + 1;
            let r = row + 1;
            slide.fields.push(self.with_icon(self.bound(
                &format!("nearCity{n}"),
                &format!("city_{r}"),
                role,
                Metric::City,
            )));
            slide.fields.push(self.bound(
                &format!("nearTemp{n}"),
                &format!("temperature_{r}"),
                role,
                Metric::Temperature,
            ));
            slide.fields.push(self.bound(
                &format!("nearWindSpeed{n}"),
                &format!("windSpeed_{r}"),
                role,
                Metric::Wind,
            ));
        }
        slide
    }

    fn thirty_six_hour(&self, period: usize) -> SlideDescriptor {
        let n = period + 1;
        let mut slide = self.slide(
            &format!("thirtysixHour{n}"),
            "36hr.png",
            self.labels.thirty_six_hour,
            10,
        );
        slide.vocal_local = period == 0 && self.package.narrated();
        let primary = LocationRole::Primary;
        slide.fields = vec![
            self.label("36hrNWS", "nws", self.labels.nws),
            self.bound(&format!("36hrName{n}"), "name", primary, Metric::PeriodName(period)),
            self.bound(
                &format!("36hrNarrative{n}"),
                "narrative",
                primary,
                Metric::Narrative(period),
            ),
        ];
        slide
    }

    fn extended(&self) -> SlideDescriptor {
        let mut slide = self.slide("Extended", "extended.png", self.labels.extended, 10);
        let primary = LocationRole::Primary;
        slide.fields = vec![self.bound("extCity", "city", primary, Metric::City)];
        for day in 0..EXTENDED_DAYS {
            let n = day + 1;
            slide.fields.extend([
                self.bound(&format!("extName{n}"), &format!("name{n}"), primary, Metric::DayName(day)),
                self.bound(&format!("extHigh{n}"), &format!("high{n}"), primary, Metric::High(day)),
                self.label(&format!("extSlash{n}"), &format!("slash{n}"), "/"),
                self.bound(&format!("extLow{n}"), &format!("low{n}"), primary, Metric::Low(day)),
                self.with_icon(self.bound(
                    &format!("extPhrase{n}"),
                    &format!("phrase{n}"),
                    primary,
                    Metric::Phrase(day),
                )),
            ]);
        }
        slide
    }

    fn almanac(&self) -> SlideDescriptor {
        use crate::store::Almanac;

        let mut slide = self.slide("Almanac", "almanac.png", self.labels.almanac, 10);
        let primary = LocationRole::Primary;
        slide.fields = vec![
            self.label("sunriseLabel", "sunriseLabel", self.labels.sunrise),
            self.label("sunsetLabel", "sunsetLabel", self.labels.sunset),
        ];
        for day in 0..Almanac::DAYS {
            let n = day + 1;
            slide.fields.extend([
                self.bound(&format!("almDow{n}"), &format!("dow{n}"), primary, Metric::DayOfWeek(day)),
                self.bound(
                    &format!("almSunriseTime{n}"),
                    &format!("sunriseTime{n}"),
                    primary,
                    Metric::Sunrise(day),
                ),
                self.bound(
                    &format!("almSunsetTime{n}"),
                    &format!("sunsetTime{n}"),
                    primary,
                    Metric::Sunset(day),
                ),
            ]);
        }
        for phase in 0..Almanac::MOON_PHASES {
            let n = phase + 1;
            let name = self.bound(&format!("almPhase{n}"), &format!("phase{n}"), primary, Metric::MoonPhase(phase));
            let image = AssetRef::new(format!("./images/moon/{}.png", name.text));
            slide.fields.push(name.with_image(image));
        }
        for phase in 0..Almanac::MOON_PHASES {
            let n = phase + 1;
            slide.fields.push(self.bound(
                &format!("almDate{n}"),
                &format!("date{n}"),
                primary,
                Metric::MoonDate(phase),
            ));
        }
        slide
    }
}
