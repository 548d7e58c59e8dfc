/// Format a percentage value for display: whole numbers render without a
/// fractional part (`"65%"`), everything else with one decimal (`"65.5%"`).
///
/// The value is rounded to one decimal before the whole-number check, so
/// `64.96` renders as `"65%"` rather than `"65.0%"`.
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}%", rounded as i64)
    } else {
        format!("{rounded:.1}%")
    }
}
