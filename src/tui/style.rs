//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Supply profile line color.
pub const SUPPLY_COLOR: Color = Color::Green;
/// Demand profile line color.
pub const DEMAND_COLOR: Color = Color::Cyan;
/// Coverage bar color when full (>= 100%).
pub const COVERAGE_FULL: Color = Color::Green;
/// Coverage bar color when partial (>= 50%).
pub const COVERAGE_MID: Color = Color::Yellow;
/// Coverage bar color when low (< 50%).
pub const COVERAGE_LOW: Color = Color::Red;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Color of consistency warnings.
pub const WARN_FG: Color = Color::Magenta;

/// Returns a bar color for a coverage percentage.
pub fn coverage_color(pct: f64) -> Color {
    if pct >= 100.0 {
        COVERAGE_FULL
    } else if pct >= 50.0 {
        COVERAGE_MID
    } else {
        COVERAGE_LOW
    }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
pub fn auto_bounds_y(supply: &[(f64, f64)], demand: &[(f64, f64)]) -> [f64; 2] {
    let all = supply.iter().chain(demand.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [(min - pad).max(0.0), max + pad]
}
