//! Tag selection matching.

use tg_common::types::{TagSelection, TagSet};
use tracing::{debug, warn};

/// Check a host's tags against a selection.
///
/// Every selected name must be present on the host with at least one value
/// in the acceptable list. Values compare case-insensitively. A host tag with
/// several values matches when any of them is acceptable.
pub fn matches(tags: &TagSet, selection: &TagSelection) -> bool {
    selection.iter().all(|(name, acceptable)| {
        let Some(host_values) = tags.get(name) else {
            debug!(tag = %name, "host does not carry selected tag");
            return false;
        };
        let hit = host_values
            .iter()
            .any(|value| acceptable.iter().any(|want| same_value(value, want)));
        if !hit {
            debug!(tag = %name, ?host_values, ?acceptable, "host tag value not selected");
        }
        hit
    })
}

/// [`matches`] on undecoded selection text. Undecodable text never matches.
pub fn matches_text(tags: &TagSet, selection_text: &str) -> bool {
    match TagSelection::decode(selection_text) {
        Ok(selection) => matches(tags, &selection),
        Err(err) => {
            warn!(%err, "rejecting host for undecodable tag selection");
            false
        }
    }
}

fn same_value(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{matches, matches_text};
    use tg_common::types::{TagSelection, TagSet};

    fn host_tags(pairs: &[(&str, &str)]) -> TagSet {
        let mut tags = TagSet::new();
        for (name, value) in pairs {
            tags.insert(name, *value);
        }
        tags
    }

    fn selection(json: &str) -> TagSelection {
        TagSelection::decode(json).expect("selection")
    }

    #[test]
    fn empty_selection_matches_anything() {
        assert!(matches(&TagSet::new(), &TagSelection::default()));
        assert!(matches(
            &host_tags(&[("location", "US")]),
            &TagSelection::default()
        ));
    }

    #[test]
    fn every_selected_tag_must_match() {
        let tags = host_tags(&[("location", "US"), ("tier", "gold")]);

        assert!(matches(
            &tags,
            &selection(r#"{"location": ["us", "ca"], "tier": ["Gold"]}"#)
        ));
        assert!(!matches(
            &tags,
            &selection(r#"{"location": ["us"], "tier": ["silver"]}"#)
        ));
    }

    #[test]
    fn missing_tag_fails() {
        let tags = host_tags(&[("location", "US")]);
        assert!(!matches(&tags, &selection(r#"{"tier": ["gold"]}"#)));
    }

    #[test]
    fn empty_acceptable_list_never_matches() {
        let tags = host_tags(&[("location", "US")]);
        assert!(!matches(&tags, &selection(r#"{"location": []}"#)));
    }

    #[test]
    fn multi_valued_host_tag_uses_any_semantics() {
        let tags = host_tags(&[("country", "US"), ("country", "CA")]);

        assert!(matches(&tags, &selection(r#"{"country": ["ca"]}"#)));
        assert!(!matches(&tags, &selection(r#"{"country": ["mx"]}"#)));
    }

    #[test]
    fn selection_text_is_decoded() {
        let tags = host_tags(&[("location", "us")]);

        assert!(matches_text(&tags, r#"{"location": ["us"]}"#));
        assert!(matches_text(&tags, r#"{"Location": "US"}"#));
        assert!(!matches_text(&tags, r#"{"location": ["eu"]}"#));
    }

    #[test]
    fn undecodable_selection_fails_closed() {
        let tags = host_tags(&[("location", "us")]);

        assert!(!matches_text(&tags, "{'location': ['us']"));
        assert!(!matches_text(&tags, "location=us"));
    }
}
