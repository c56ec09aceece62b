use std::fs;
use std::path::Path;

use super::error::PredictError;

/// Find the element pair for `name` in an element-group file.
///
/// Handles both two-line entries (name line, line 1, line 2) and the 3LE
/// variant where the name line carries a leading `0 `. Matching is an exact,
/// case-insensitive comparison against the name line. Returns the two raw
/// element lines, uppercased and trimmed.
pub fn find_in_file(path: &Path, name: &str) -> Result<(String, String), PredictError> {
    let content = fs::read_to_string(path)?;
    let target = name.trim().to_uppercase();

    // Shift-register over the last three non-empty lines.
    let mut line1 = String::new();
    let mut line2 = String::new();
    for raw in content.lines() {
        let mut line = raw.trim().to_uppercase();
        if let Some(stripped) = line.strip_prefix("0 ") {
            line = stripped.to_string();
        }
        if line.is_empty() {
            continue;
        }
        let sat_name = std::mem::replace(&mut line1, std::mem::replace(&mut line2, line));
        if sat_name == target && line1.starts_with('1') && line2.starts_with('2') {
            return Ok((line1, line2));
        }
    }

    Err(PredictError::SatelliteNotFound(target))
}

/// List every satellite name found in an element-group file.
pub fn satellite_names(path: &Path) -> Result<Vec<String>, PredictError> {
    let content = fs::read_to_string(path)?;
    let mut names = Vec::new();

    let mut line1 = String::new();
    let mut line2 = String::new();
    for raw in content.lines() {
        let mut line = raw.trim().to_uppercase();
        if let Some(stripped) = line.strip_prefix("0 ") {
            line = stripped.to_string();
        }
        if line.is_empty() {
            continue;
        }
        let name = std::mem::replace(&mut line1, std::mem::replace(&mut line2, line));
        if !name.is_empty() && line1.starts_with('1') && line2.starts_with('2') {
            names.push(name);
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ISS_LINE1: &str =
        "1 25544U 98067A   22273.81956581  .00006857  00000+0  12973-3 0  9999";
    const ISS_LINE2: &str =
        "2 25544  51.6432 305.0192 0002674 134.1797 327.8485 15.50354779361579";
    const AO7_LINE1: &str =
        "1 07530U 74089B   22273.84566985 -.00000038  00000+0  84892-4 0  9996";
    const AO7_LINE2: &str =
        "2 07530 101.9607 263.5963 0012280 142.2171 280.5016 12.53656985188971";

    fn write_file(tag: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("satcat-tle-{}-{}.txt", std::process::id(), tag));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn finds_named_entry() {
        let content = format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\nAO-07\n{AO7_LINE1}\n{AO7_LINE2}\n");
        let path = write_file("find", &content);
        let (l1, l2) = find_in_file(&path, "ao-07").unwrap();
        assert!(l1.starts_with("1 07530"));
        assert!(l2.starts_with("2 07530"));
        fs::remove_file(path).ok();
    }

    #[test]
    fn strips_3le_name_prefix() {
        let content = format!("0 ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n");
        let path = write_file("three-le", &content);
        let (l1, _) = find_in_file(&path, "ISS (ZARYA)").unwrap();
        assert!(l1.starts_with("1 25544"));
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_satellite_is_an_error() {
        let content = format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n");
        let path = write_file("missing", &content);
        let err = find_in_file(&path, "NOAA 19").unwrap_err();
        assert!(matches!(err, PredictError::SatelliteNotFound(_)));
        fs::remove_file(path).ok();
    }

    #[test]
    fn lists_all_names() {
        let content = format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\nAO-07\n{AO7_LINE1}\n{AO7_LINE2}\n");
        let path = write_file("list", &content);
        let names = satellite_names(&path).unwrap();
        assert_eq!(names, vec!["ISS (ZARYA)".to_string(), "AO-07".to_string()]);
        fs::remove_file(path).ok();
    }
}
