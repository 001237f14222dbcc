use serde::{Deserialize, Serialize};

/// One reading of the page's telemetry, in canonical units.
/// Rebuilt from the document on every recompute; any field may be NaN
/// when the underlying text failed to parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetrySample {
    pub moving_time_s: f64, // seconds
    pub distance_m: f64,    // meters
    pub power_w: f64,       // watts
    pub cadence_spm: f64,   // steps/min
    pub form_power_w: f64,  // watts
}

/// Metrics derived from one sample. Replaced wholesale, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct DerivedMetrics {
    pub running_economy: f64,    // (m/s) per (W/kg)
    pub critical_power_pct: f64, // floored integer percent
    pub stride_length_m: f64,    // meters
    pub power_to_weight: f64,    // W/kg
    pub form_power_ratio: f64,   // dimensionless
}

/// User preferences, loaded once per session and treated as an immutable
/// snapshot. On-disk keys are camelCase; missing keys fall back to the
/// documented defaults {70, 0, true, true, true, true}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub weight: f64, // body weight, kg
    pub cp: i64,     // critical power override, W (0 = derive from page)
    pub stride_length_toggle: bool,
    pub cp_toggle: bool,
    pub fpr_toggle: bool,
    pub wpkg_toggle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weight: 70.0,
            cp: 0,
            stride_length_toggle: true,
            cp_toggle: true,
            fpr_toggle: true,
            wpkg_toggle: true,
        }
    }
}

impl Settings {
    /// Valid range for a user-supplied critical power override, watts.
    pub const CP_RANGE: std::ops::RangeInclusive<i64> = 1..=1500;

    /// Out-of-range `cp` means "derive from page".
    pub fn sanitized(mut self) -> Self {
        if self.cp != 0 && !Self::CP_RANGE.contains(&self.cp) {
            log::warn!(
                "cp override {} outside 1..=1500, deriving from page",
                self.cp
            );
            self.cp = 0;
        }
        self
    }
}
