//! Permission aggregation and the authorization decision point
//!
//! An admin's effective permission set is the union of the permissions of
//! all assigned roles and any directly granted permissions, deduplicated by
//! slug. The merge preserves first-occurrence order; callers that need a
//! deterministic ordering sort explicitly.

use std::collections::HashSet;

/// Merge permission slug sources into a single deduplicated set.
///
/// `None` entries model dangling grant rows and are dropped. The result
/// keeps the insertion order of each slug's first occurrence.
pub fn merge_permission_slugs<I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for slug in sources.into_iter().flatten() {
        if seen.insert(slug.clone()) {
            merged.push(slug);
        }
    }

    merged
}

/// Decide whether a caller's resolved permission set satisfies an
/// endpoint's requirement: any one of the required slugs must be present.
pub fn has_any_permission(granted: &[String], required: &[&str]) -> bool {
    if required.is_empty() {
        return true;
    }

    required.iter().any(|req| granted.iter().any(|g| g == req))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(slugs: &[&str]) -> Vec<Option<String>> {
        slugs.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_merge_deduplicates_by_slug() {
        let role_slugs = some(&["admin.view", "role.view", "admin.view"]);
        let direct_slugs = some(&["role.view", "kanban.view"]);

        let merged = merge_permission_slugs(role_slugs.into_iter().chain(direct_slugs));

        assert_eq!(merged, vec!["admin.view", "role.view", "kanban.view"]);
    }

    #[test]
    fn test_merge_returns_no_duplicates() {
        let sources = some(&["a", "b", "a", "c", "b", "a"]);
        let merged = merge_permission_slugs(sources);

        let unique: HashSet<_> = merged.iter().collect();
        assert_eq!(unique.len(), merged.len());
    }

    #[test]
    fn test_merge_drops_dangling_entries() {
        let sources = vec![
            Some("kanban.view".to_string()),
            None,
            Some("profile.view".to_string()),
            None,
        ];

        let merged = merge_permission_slugs(sources);
        assert_eq!(merged, vec!["kanban.view", "profile.view"]);
    }

    #[test]
    fn test_merge_preserves_first_occurrence_order() {
        let merged = merge_permission_slugs(some(&["z.last", "a.first", "z.last"]));
        assert_eq!(merged, vec!["z.last", "a.first"]);
    }

    #[test]
    fn test_merge_of_role_and_direct_grants() {
        // Role grants kanban.view directly plus profile.view via a role
        let role_slugs = some(&["profile.view"]);
        let direct_slugs = some(&["kanban.view"]);

        let merged = merge_permission_slugs(role_slugs.into_iter().chain(direct_slugs));

        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&"kanban.view".to_string()));
        assert!(merged.contains(&"profile.view".to_string()));
    }

    #[test]
    fn test_merge_empty_sources() {
        let merged = merge_permission_slugs(Vec::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_has_any_permission_match() {
        let granted = vec!["admin.view".to_string(), "role.view".to_string()];
        assert!(has_any_permission(&granted, &["role.view"]));
        assert!(has_any_permission(&granted, &["role.create", "admin.view"]));
    }

    #[test]
    fn test_has_any_permission_denied() {
        let granted = vec!["admin.view".to_string()];
        assert!(!has_any_permission(&granted, &["role.view"]));
        assert!(!has_any_permission(&[], &["role.view"]));
    }

    #[test]
    fn test_has_any_permission_with_no_requirement() {
        assert!(has_any_permission(&[], &[]));
    }
}
