//! Derived running metrics and the display gate.

use crate::types::{DerivedMetrics, TelemetrySample};

/// Pure calculation of every derived metric from one telemetry sample.
///
/// Divisions by zero or by a not-yet-available denominator produce
/// NaN/inf on purpose; [`display_gate`] suppresses them downstream.
/// `cp_w = 0` (or NaN) makes CP% unavailable the same way.
pub fn derive_metrics(cp_w: f64, weight_kg: f64, s: &TelemetrySample) -> DerivedMetrics {
    let pace_ms = s.distance_m / s.moving_time_s; // m/s
    DerivedMetrics {
        critical_power_pct: (s.power_w / cp_w * 100.0).floor(),
        stride_length_m: (pace_ms * 60.0) / s.cadence_spm,
        running_economy: pace_ms / (s.power_w / weight_kg),
        power_to_weight: s.power_w / weight_kg,
        form_power_ratio: s.form_power_w / s.power_w,
    }
}

/// A metric is displayed only when it is a finite, strictly positive
/// number and its preference toggle is on. This is the sole error-handling
/// strategy for missing telemetry: silent non-display.
pub fn display_gate(value: f64, enabled: bool) -> Option<f64> {
    if enabled && value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// RE shows three decimals.
pub fn format_economy(v: f64) -> String {
    format!("{v:.3}")
}

/// Stride length shows two decimals.
pub fn format_stride(v: f64) -> String {
    format!("{v:.2}")
}

/// W/kg and FPR show two decimals.
pub fn format_ratio(v: f64) -> String {
    format!("{v:.2}")
}

/// CP% is an already-floored integer percent.
pub fn format_percent(v: f64) -> String {
    format!("{}", v as i64)
}
