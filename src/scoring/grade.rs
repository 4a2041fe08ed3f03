/// Converts an overall ESG score (0–100) into a letter rating.
///
/// | Range       | Rating |
/// |-------------|--------|
/// | >= 85       | A      |
/// | >= 70       | B      |
/// | >= 55       | C      |
/// | >= 40       | D      |
/// | < 40        | E      |
pub fn rating(score: f64) -> String {
    match score {
        s if s >= 85.0 => "A".into(),
        s if s >= 70.0 => "B".into(),
        s if s >= 55.0 => "C".into(),
        s if s >= 40.0 => "D".into(),
        _ => "E".into(),
    }
}
