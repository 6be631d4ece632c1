//! Output file naming
//!
//! Every tool derives its output names from the input file name here, so the
//! extension handling is identical across the cropper, sorter and analyzer.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Split a file name into stem and extension (with its dot).
///
/// Only the last dot counts, and a leading dot is part of the stem.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// `<base>_p<label><ext>`
pub fn cropped_file_name(file_name: &str, label: &str) -> String {
    let (base, ext) = split_extension(file_name);
    format!("{base}_p{label}{ext}")
}

/// `<base>_<label><ext>`
pub fn counter_file_name(file_name: &str, label: &str) -> String {
    let (base, ext) = split_extension(file_name);
    format!("{base}_{label}{ext}")
}

/// `<root>/<label>/<base>_<label><ext>`
pub fn sorted_destination(root: &Path, file_name: &str, label: &str) -> PathBuf {
    root.join(label).join(counter_file_name(file_name, label))
}

/// `<dir>/<base>_analysis.docx`
pub fn analysis_path(image_path: &Path) -> PathBuf {
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, _) = split_extension(&file_name);
    image_path.with_file_name(format!("{base}_analysis.docx"))
}

/// Keep only ASCII digits
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

fn question_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_p(\d+)\D*$").expect("static pattern"))
}

/// Question number encoded in a cropped file name.
///
/// `scan_p12.png` gives 12. Longer runs carry two trailing digits that are
/// not part of the question (`scan_p1240.png` gives 12).
pub fn question_number(file_name: &str) -> Option<u64> {
    let captures = question_pattern().captures(file_name)?;
    let digits = captures.get(1)?.as_str();
    let digits = if digits.len() > 2 {
        &digits[..digits.len() - 2]
    } else {
        digits
    };
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("scan.png"), ("scan", ".png"));
        assert_eq!(split_extension("a.b.JPG"), ("a.b", ".JPG"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_cropped_name_preserves_extension() {
        for name in ["p.png", "IMG 001.JPG", "x.y.tiff", "noext", "a.jpeg"] {
            let out = cropped_file_name(name, "42");
            assert_eq!(split_extension(&out).1, split_extension(name).1, "{name}");
        }
        assert_eq!(cropped_file_name("scan.png", "17"), "scan_p17.png");
        assert_eq!(cropped_file_name("scan.png", "unknown"), "scan_punknown.png");
    }

    #[test]
    fn test_sorted_destination() {
        let dest = sorted_destination(Path::new("/shots"), "cap.PNG", "7");
        assert_eq!(dest, PathBuf::from("/shots/7/cap_7.PNG"));
    }

    #[test]
    fn test_analysis_path() {
        assert_eq!(
            analysis_path(Path::new("/q/question_p12.jpg")),
            PathBuf::from("/q/question_p12_analysis.docx")
        );
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only(" 1 2a3\n"), "123");
        assert_eq!(digits_only("no digits"), "");
        assert_eq!(digits_only("٣"), "");
    }

    #[test]
    fn test_question_number() {
        assert_eq!(question_number("name_p5.png"), Some(5));
        assert_eq!(question_number("name_p15.png"), Some(15));
        assert_eq!(question_number("name_p1240.png"), Some(12));
        assert_eq!(question_number("name_punknown.png"), None);
        assert_eq!(question_number("plain.png"), None);
    }
}
