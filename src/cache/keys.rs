//! Cache entry locations
//!
//! Layout under the cache directory:
//!
//! ```text
//! modelNames.json
//! modelsInfo.json
//! fields/<key>.json
//! sampleRecords/<key>_sample.json
//! ```
//!
//! `<key>` is the model name with `.` (and anything else unsafe in a file name)
//! replaced by `_`. Logical keys stay the dotted model name.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MODEL_NAMES_FILE: &str = "modelNames.json";
pub const MODELS_INFO_FILE: &str = "modelsInfo.json";
pub const FIELDS_DIR: &str = "fields";
pub const SAMPLES_DIR: &str = "sampleRecords";

static UNSAFE_KEY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());

/// File-name-safe key for a model
pub fn cache_key(model: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(model, "_").into_owned()
}

pub fn fields_path(model: &str) -> String {
    format!("{}/{}.json", FIELDS_DIR, cache_key(model))
}

pub fn sample_path(model: &str) -> String {
    format!("{}/{}_sample.json", SAMPLES_DIR, cache_key(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_names_become_underscored() {
        assert_eq!(cache_key("res.partner"), "res_partner");
        assert_eq!(fields_path("hr.employee"), "fields/hr_employee.json");
        assert_eq!(
            sample_path("account.move.line"),
            "sampleRecords/account_move_line_sample.json"
        );
    }

    #[test]
    fn test_path_characters_are_neutralized() {
        assert_eq!(cache_key("../etc/passwd"), "___etc_passwd");
    }
}
