//! Flat key scheme of the small store.
//!
//! The small store has no collections, so each record's key is prefixed with
//! its collection: `novel_<id>`, `progress_<id>`, `font_<id>`. Settings live
//! under the bare key `settings`.

use crate::schema::Collection;

pub const NOVEL_PREFIX: &str = "novel_";
pub const PROGRESS_PREFIX: &str = "progress_";
pub const FONT_PREFIX: &str = "font_";
/// Key of the single settings record.
pub const SETTINGS_KEY: &str = "settings";

const SETTINGS_PREFIX: &str = "settings_";

/// Key under which `(collection, key)` is stored in the small store.
pub fn flat_key(collection: Collection, key: &str) -> String {
    match collection {
        Collection::Novels => format!("{NOVEL_PREFIX}{key}"),
        Collection::Progress => format!("{PROGRESS_PREFIX}{key}"),
        Collection::Fonts => format!("{FONT_PREFIX}{key}"),
        Collection::Settings if key == SETTINGS_KEY => SETTINGS_KEY.to_string(),
        Collection::Settings => format!("{SETTINGS_PREFIX}{key}"),
    }
}

/// Inverse of [`flat_key`]. Keys written by anything else yield `None`.
pub fn parse_flat_key(flat: &str) -> Option<(Collection, &str)> {
    if flat == SETTINGS_KEY {
        return Some((Collection::Settings, SETTINGS_KEY));
    }

    [
        (NOVEL_PREFIX, Collection::Novels),
        (PROGRESS_PREFIX, Collection::Progress),
        (FONT_PREFIX, Collection::Fonts),
        (SETTINGS_PREFIX, Collection::Settings),
    ]
    .into_iter()
    .find_map(|(prefix, collection)| flat.strip_prefix(prefix).map(|key| (collection, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for collection in Collection::ALL {
            for key in ["a_1_2", SETTINGS_KEY, "x y"] {
                let flat = flat_key(collection, key);
                assert_eq!(parse_flat_key(&flat), Some((collection, key)));
            }
        }
    }

    #[test]
    fn known_layout() {
        assert_eq!(flat_key(Collection::Novels, "b_1_2"), "novel_b_1_2");
        assert_eq!(flat_key(Collection::Progress, "b_1_2"), "progress_b_1_2");
        assert_eq!(flat_key(Collection::Settings, SETTINGS_KEY), "settings");
        assert_eq!(parse_flat_key("theme"), None);
    }
}
