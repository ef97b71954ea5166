//! OpenWeatherMap condition codes to weather icons.
//!
//! Codes are documented at <https://openweathermap.org/weather-conditions>.

const ASSET_DIR: &str = "./assets/images";
const OWM_ICON_URL: &str = "https://openweathermap.org/img/wn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    ClearSky,
    BrokenClouds,
    FewClouds,
    Mist,
    Rain,
    ScatteredClouds,
    ShowerRain,
    Snow,
    Thunderstorm,
}

const TABLE: [(Icon, &[u16]); 9] = [
    (Icon::ClearSky, &[800]),
    (Icon::BrokenClouds, &[803, 804]),
    (Icon::FewClouds, &[801]),
    (
        Icon::Mist,
        &[701, 711, 721, 731, 741, 751, 761, 762, 771, 781],
    ),
    (Icon::Rain, &[500, 501, 502, 503, 504]),
    (Icon::ScatteredClouds, &[802]),
    (
        Icon::ShowerRain,
        &[520, 521, 522, 531, 300, 301, 302, 310, 311, 312, 313, 314, 321],
    ),
    (
        Icon::Snow,
        &[511, 600, 601, 602, 611, 612, 615, 616, 620, 621, 622],
    ),
    (
        Icon::Thunderstorm,
        &[200, 201, 202, 210, 211, 212, 221, 230, 231, 232],
    ),
];

impl Icon {
    /// Look up the icon for a condition code. Unlisted codes have none.
    pub fn from_code(code: u16) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, codes)| codes.contains(&code))
            .map(|(icon, _)| *icon)
    }

    pub fn asset_name(self) -> &'static str {
        match self {
            Icon::ClearSky => "clear-sky.png",
            Icon::BrokenClouds => "broken-clouds.png",
            Icon::FewClouds => "few-clouds.png",
            Icon::Mist => "mist.png",
            Icon::Rain => "rain.png",
            Icon::ScatteredClouds => "scattered-clouds.png",
            Icon::ShowerRain => "shower-rain.png",
            Icon::Snow => "snow.png",
            Icon::Thunderstorm => "thunderstorm.png",
        }
    }

    /// Image asset for the icon. The terminal draws `glyph` instead; the path
    /// is only recorded in the log when the current view changes, so the
    /// asset table stays checkable against a packaged image set.
    pub fn asset_path(self) -> String {
        format!("{ASSET_DIR}/{}", self.asset_name())
    }

    /// Single-cell glyph for the terminal.
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::ClearSky => "☀",
            Icon::BrokenClouds => "☁",
            Icon::FewClouds => "⛅",
            Icon::Mist => "≡",
            Icon::Rain => "☂",
            Icon::ScatteredClouds => "☁",
            Icon::ShowerRain => "☔",
            Icon::Snow => "❄",
            Icon::Thunderstorm => "⚡",
        }
    }
}

/// OpenWeatherMap's hosted image for an icon id such as `"10d"`.
pub fn icon_url(icon_id: &str) -> String {
    format!("{OWM_ICON_URL}/{icon_id}@2x.png")
}

/// Map an OpenWeatherMap icon id (`"01d"`, `"10n"`, ...) to a glyph.
pub fn glyph_for_icon_id(icon_id: &str) -> &'static str {
    let icon = match icon_id.get(..2) {
        Some("01") => Icon::ClearSky,
        Some("02") => Icon::FewClouds,
        Some("03") => Icon::ScatteredClouds,
        Some("04") => Icon::BrokenClouds,
        Some("09") => Icon::ShowerRain,
        Some("10") => Icon::Rain,
        Some("11") => Icon::Thunderstorm,
        Some("13") => Icon::Snow,
        Some("50") => Icon::Mist,
        _ => return "?",
    };
    icon.glyph()
}
