//! US EPA Air Quality Index for PM2.5.
//!
//! Converts a PM2.5 concentration into an index using the EPA breakpoint
//! table, classifies the index into one of six severity tiers and maps it
//! onto a six segment visual scale. None of these functions fail: negative
//! concentrations clamp to zero, oversized ones extrapolate along the last
//! breakpoint row, and a missing PM2.5 value degrades to the provider's coarse
//! index (or to an "unavailable" zero index).

use serde::{Deserialize, Serialize};

/// One row of the PM2.5 breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub conc_low: f64,
    pub conc_high: f64,
    pub index_low: u32,
    pub index_high: u32,
}

impl Breakpoint {
    const fn new(conc_low: f64, conc_high: f64, index_low: u32, index_high: u32) -> Self {
        Self {
            conc_low,
            conc_high,
            index_low,
            index_high,
        }
    }

    // AQI = ((AQIhigh - AQIlow) / (Chigh - Clow)) * (C - Clow) + AQIlow
    fn interpolate(&self, concentration: f64) -> u32 {
        let slope = f64::from(self.index_high - self.index_low) / (self.conc_high - self.conc_low);
        let aqi = slope * (concentration - self.conc_low) + f64::from(self.index_low);
        // f64::round is half away from zero, so x.5 rounds up for positive values.
        aqi.round() as u32
    }
}

/// PM2.5 breakpoints in µg/m³, ascending. The last row also covers anything
/// above its nominal upper bound.
pub const BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint::new(0.0, 12.0, 0, 50),       // Good
    Breakpoint::new(12.1, 35.4, 51, 100),    // Moderate
    Breakpoint::new(35.5, 55.4, 101, 150),   // Unhealthy for Sensitive Groups
    Breakpoint::new(55.5, 150.4, 151, 200),  // Unhealthy
    Breakpoint::new(150.5, 250.4, 201, 300), // Very Unhealthy
    Breakpoint::new(250.5, 500.4, 301, 500), // Hazardous
];

/// Width of one tier on the visual scale, in percent.
pub const SEGMENT_WIDTH: f64 = 100.0 / 6.0;

const POSITION_EPSILON: f64 = 1e-9;

/// Scale multiplier applied to the provider's 1-5 category when no PM2.5
/// value is available.
pub const COARSE_INDEX_FACTOR: u32 = 20;

/// Severity tier of an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Good,
        Tier::Moderate,
        Tier::UnhealthyForSensitiveGroups,
        Tier::Unhealthy,
        Tier::VeryUnhealthy,
        Tier::Hazardous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tier::Good => "Good",
            Tier::Moderate => "Moderate",
            Tier::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Tier::Unhealthy => "Unhealthy",
            Tier::VeryUnhealthy => "Very Unhealthy",
            Tier::Hazardous => "Hazardous",
        }
    }

    /// Display weight token consumed by the presentation layer.
    pub fn weight(self) -> &'static str {
        match self {
            Tier::Good => "tier-1",
            Tier::Moderate => "tier-2",
            Tier::UnhealthyForSensitiveGroups => "tier-3",
            Tier::Unhealthy => "tier-4",
            Tier::VeryUnhealthy => "tier-5",
            Tier::Hazardous => "tier-6",
        }
    }

    /// Zero based position of the tier on the scale.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Index span used to place a value inside the tier's scale segment.
    ///
    /// The lower bounds overlap the previous tier's upper bound (50, 100, ...)
    /// so that positions stay continuous across segments. The open ended
    /// hazardous tier is positioned over 300-500.
    pub fn scale_span(self) -> (f64, f64) {
        match self {
            Tier::Good => (0.0, 50.0),
            Tier::Moderate => (50.0, 100.0),
            Tier::UnhealthyForSensitiveGroups => (100.0, 150.0),
            Tier::Unhealthy => (150.0, 200.0),
            Tier::VeryUnhealthy => (200.0, 300.0),
            Tier::Hazardous => (300.0, 500.0),
        }
    }

    /// Tier whose scale segment contains `position`.
    ///
    /// Segments are closed at their upper edge: a position exactly on a
    /// boundary belongs to the lower tier, matching `classify`'s inclusive
    /// upper bounds.
    pub fn at_scale_position(position: f64) -> Tier {
        let scaled = position / SEGMENT_WIDTH - POSITION_EPSILON;
        let ordinal = (scaled.ceil() as i64 - 1).clamp(0, 5) as usize;
        Tier::ALL[ordinal]
    }
}

/// Where an [`AqiResult`]'s index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBasis {
    /// Computed from a PM2.5 concentration with the EPA formula.
    Pm25,
    /// Approximated from the provider's 1-5 category. Degraded accuracy.
    CoarseIndex,
    /// Neither input was usable; the index is a placeholder zero.
    Unavailable,
}

/// Output of the AQI pipeline for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiResult {
    pub index: u32,
    pub tier: Tier,
    pub label: &'static str,
    pub severity_weight: &'static str,
    pub scale_position_percent: f64,
    pub basis: IndexBasis,
}

impl AqiResult {
    pub fn from_index(index: u32, basis: IndexBasis) -> Self {
        let tier = classify(index);
        Self {
            index,
            tier,
            label: tier.label(),
            severity_weight: tier.weight(),
            scale_position_percent: scale_position(index),
            basis,
        }
    }

    /// True when the index was not computed from a PM2.5 concentration.
    pub fn is_approximate(&self) -> bool {
        self.basis != IndexBasis::Pm25
    }
}

/// Pollutant concentrations reported by a data source, in µg/m³.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub so2: f64,
    #[serde(default)]
    pub nh3: f64,
    #[serde(default)]
    pub pm2_5: Option<f64>,
    #[serde(default)]
    pub pm10: f64,
}

impl PollutantReading {
    /// The PM2.5 value if it can be fed to [`compute_index`].
    pub fn usable_pm2_5(&self) -> Option<f64> {
        self.pm2_5.filter(|value| value.is_finite())
    }
}

/// Clamp a raw concentration into the table's domain. Negative and NaN
/// inputs become zero.
pub fn clamp_concentration(concentration: f64) -> f64 {
    if concentration.is_nan() || concentration < 0.0 {
        0.0
    } else {
        concentration
    }
}

/// Floor a concentration to 0.1 µg/m³, the EPA reporting precision.
pub fn truncate_concentration(concentration: f64) -> f64 {
    (concentration * 10.0).floor() / 10.0
}

/// Breakpoint row covering an already truncated, non-negative concentration.
pub fn breakpoint_for(concentration: f64) -> &'static Breakpoint {
    BREAKPOINTS
        .iter()
        .find(|bp| concentration <= bp.conc_high)
        .unwrap_or(&BREAKPOINTS[BREAKPOINTS.len() - 1])
}

/// Calculate the AQI for a PM2.5 concentration.
///
/// # Arguments
///
/// * `pm25` - PM2.5 concentration in µg/m³
///
/// # Returns
///
/// The EPA index. Negative input yields 0. There is no upper clamp, so a
/// concentration past 500.4 extrapolates beyond 500.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(compute_index(9.3), 39);
/// assert_eq!(compute_index(12.1), 51);
/// ```
pub fn compute_index(pm25: f64) -> u32 {
    let concentration = truncate_concentration(clamp_concentration(pm25));
    breakpoint_for(concentration).interpolate(concentration)
}

/// Severity tier for an index. Anything above 300 is hazardous.
pub fn classify(index: u32) -> Tier {
    match index {
        0..=50 => Tier::Good,
        51..=100 => Tier::Moderate,
        101..=150 => Tier::UnhealthyForSensitiveGroups,
        151..=200 => Tier::Unhealthy,
        201..=300 => Tier::VeryUnhealthy,
        _ => Tier::Hazardous,
    }
}

/// Position of an index on the six segment scale, in percent (0..=100).
pub fn scale_position(index: u32) -> f64 {
    let tier = classify(index);
    let (low, high) = tier.scale_span();
    let fraction = (f64::from(index) - low) / (high - low);
    (SEGMENT_WIDTH * (tier.ordinal() as f64 + fraction)).min(100.0)
}

/// Approximate index from the provider's 1-5 category, or `None` when the
/// category is out of range.
pub fn approximate_from_coarse(coarse_index: u8) -> Option<u32> {
    (1..=5)
        .contains(&coarse_index)
        .then(|| u32::from(coarse_index) * COARSE_INDEX_FACTOR)
}

/// Run the whole pipeline.
///
/// A usable PM2.5 value always wins. The coarse category is only consulted
/// when PM2.5 is missing or not finite, and the result is then flagged
/// [`IndexBasis::CoarseIndex`].
pub fn assess(pm2_5: Option<f64>, coarse_index: Option<u8>) -> AqiResult {
    if let Some(pm25) = pm2_5.filter(|value| value.is_finite()) {
        return AqiResult::from_index(compute_index(pm25), IndexBasis::Pm25);
    }
    match coarse_index.and_then(approximate_from_coarse) {
        Some(index) => AqiResult::from_index(index, IndexBasis::CoarseIndex),
        None => AqiResult::from_index(0, IndexBasis::Unavailable),
    }
}

/// [`assess`] for a full reading.
pub fn assess_reading(reading: &PollutantReading, coarse_index: Option<u8>) -> AqiResult {
    assess(reading.usable_pm2_5(), coarse_index)
}
