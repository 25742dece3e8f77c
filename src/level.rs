use crate::catalog::LevelCode;

/// Maps the serving hostname to an audience tier via its first dot-delimited
/// label. Labels are lowercased before matching so mixed-case hosts resolve
/// the same way. Anything unrecognized, including an empty hostname, falls
/// back to high school, the system-wide default tier.
pub fn detect(hostname: &str) -> LevelCode {
    let first = hostname
        .split('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match first.as_str() {
        "k" | "kindergarten" => LevelCode::K,
        "p" | "primary" => LevelCode::P,
        "h" | "high" => LevelCode::H,
        _ => LevelCode::H,
    }
}
