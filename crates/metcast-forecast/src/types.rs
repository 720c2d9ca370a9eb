use serde::{Deserialize, Serialize};

/// Tide direction as published in the bulletin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

/// A single tide table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideInfo {
    #[serde(rename = "type")]
    pub kind: TideKind,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

/// Islands with their own tide tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Island {
    Trinidad,
    Tobago,
}

/// One complete forecast bulletin.
///
/// Treated as an immutable value: a successful fetch replaces the whole
/// snapshot rather than patching fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub id: String,
    pub forecast_period: String,
    pub general_synopsis: String,
    pub forecaster_name: String,
    pub issue_time: String,
    #[serde(rename = "imageTrin", default)]
    pub image_trinidad: String,
    #[serde(rename = "imagebago", default)]
    pub image_tobago: String,

    // Temperatures (°C)
    pub piarco_max: f64,
    pub piarco_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piarco_actual_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piarco_actual_min: Option<f64>,
    pub crown_point_max: f64,
    pub crown_point_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crown_point_actual_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crown_point_actual_min: Option<f64>,
    pub heat_index_piarco: f64,
    pub heat_index_crown_point: f64,

    // Marine
    pub seas_state: String,
    pub wave_heights_open: String,
    pub wave_heights_sheltered: String,

    #[serde(default)]
    pub tides_trinidad: Vec<TideInfo>,
    #[serde(default)]
    pub tides_tobago: Vec<TideInfo>,

    pub sunrise_time: String,
    pub sunset_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moonrise_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moonset_time: Option<String>,

    pub outlook_24hr: String,
    pub outlook_48hr: String,
    pub outlook_24hr_max_min: String,
    pub outlook_48hr_max_min: String,
}

impl ForecastSnapshot {
    /// Tide table for one island
    pub fn tides_for(&self, island: Island) -> &[TideInfo] {
        match island {
            Island::Trinidad => &self.tides_trinidad,
            Island::Tobago => &self.tides_tobago,
        }
    }
}

/// Lifecycle of the forecast as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    /// First load, nothing to show yet
    Loading,
    /// User-triggered refresh
    Refreshing,
    Ready(ForecastSnapshot),
    Failed {
        reason: String,
        last_known: Option<ForecastSnapshot>,
    },
}

impl FetchState {
    /// True while a fetch is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::Refreshing)
    }

    /// The snapshot to render, if any
    pub fn snapshot(&self) -> Option<&ForecastSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            Self::Failed { last_known, .. } => last_known.as_ref(),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
