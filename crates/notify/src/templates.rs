//! SMS wording for livestock health alerts.
//!
//! The texts are fixed contract with farm operators; changing them breaks
//! downstream SMS parsing some co-ops run on their side.

/// Fallback when the metric kind is not recognized.
const FALLBACK: &str = "Livestock Alert: Abnormal Health Parameter Detected!";

/// Render the alert SMS body for a breached metric.
///
/// `exceeding` selects the High/Low wording: `true` means the value broke
/// the upper bound, `false` the lower one. Unknown metric kinds fall back
/// to a generic alert line.
#[must_use]
pub fn livestock_alert(metric: &str, value: f64, exceeding: bool) -> String {
    let state = if exceeding { "High" } else { "Low" };
    match metric {
        "temperature" => format!(
            "Livestock Alert: {state} temperature detected!\nCurrent temperature: {value:.1}°C."
        ),
        "pulse" => {
            format!("Livestock Alert: {state} pulse detected!\nCurrent pulse: {value:.0} BPM.")
        }
        _ => FALLBACK.to_string(),
    }
}
