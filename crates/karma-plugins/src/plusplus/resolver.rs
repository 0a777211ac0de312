//! Fuzzy name resolution.
//!
//! A free-text name is tried against six tiers in a fixed order. The first
//! tier that yields exactly one user wins; tiers yielding zero or several
//! users are skipped, so an ambiguous early tier never blocks a later one.

use tracing::trace;

use karma_core::{Directory, MatchKind, NameField, User};

use crate::error::{AwardError, AwardResult};

/// Resolution order.
const TIERS: [(NameField, MatchKind); 6] = [
    (NameField::Mention, MatchKind::Exact),
    (NameField::Mention, MatchKind::Prefix),
    (NameField::Display, MatchKind::Exact),
    (NameField::Display, MatchKind::Prefix),
    (NameField::Mention, MatchKind::Substring),
    (NameField::Display, MatchKind::Substring),
];

/// Resolves `name` (with or without a leading `@`) to one user.
pub async fn resolve_user(directory: &dyn Directory, name: &str) -> AwardResult<User> {
    let fragment = name.strip_prefix('@').unwrap_or(name);

    for (field, kind) in TIERS {
        let mut found = directory.search(field, kind, fragment).await?;
        trace!(?field, ?kind, fragment, matches = found.len(), "Resolver tier");
        if found.len() == 1
            && let Some(user) = found.pop()
        {
            return Ok(user);
        }
    }

    Err(AwardError::NameNotFound {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_core::RosterEntry;
    use karma_store::SqliteStore;

    async fn directory(entries: &[(&str, &str, &str)]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let roster: Vec<_> = entries
            .iter()
            .map(|(jid, name, mention)| RosterEntry::new(*jid, *name, *mention))
            .collect();
        store.refresh_roster(&roster).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_prefix_tier_resolves_single_match() {
        let dir = directory(&[("1_1@chat.example.com", "Robert Smith", "bobby")]).await;
        let user = resolve_user(&dir, "bob").await.unwrap();
        assert_eq!(user.mention_name, "bobby");
    }

    #[tokio::test]
    async fn test_ambiguous_prefix_without_later_match_fails() {
        let dir = directory(&[
            ("1_1@chat.example.com", "Robert Smith", "bobby"),
            ("1_2@chat.example.com", "Elizabeth Jones", "bobette"),
        ])
        .await;
        let err = resolve_user(&dir, "bob").await.unwrap_err();
        assert!(matches!(err, AwardError::NameNotFound { ref name } if name == "bob"));
    }

    #[tokio::test]
    async fn test_ambiguous_tier_is_skipped_not_terminal() {
        // Mention prefix "al" matches two users, display exact matches one.
        let dir = directory(&[
            ("1_1@chat.example.com", "Alice Liddell", "alice"),
            ("1_2@chat.example.com", "Al", "albert"),
        ])
        .await;
        let user = resolve_user(&dir, "al").await.unwrap();
        assert_eq!(user.id, 2);
    }

    #[tokio::test]
    async fn test_exact_beats_prefix_and_is_case_insensitive() {
        let dir = directory(&[
            ("1_1@chat.example.com", "Bob Stone", "bob"),
            ("1_2@chat.example.com", "Bobby Tables", "bobby"),
        ])
        .await;
        assert_eq!(resolve_user(&dir, "BOB").await.unwrap().id, 1);
        assert_eq!(resolve_user(&dir, "@bob").await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_display_and_substring_tiers() {
        let dir = directory(&[
            ("1_1@chat.example.com", "Carol Danvers", "captain"),
            ("1_2@chat.example.com", "Diana Prince", "wonder_woman"),
        ])
        .await;
        assert_eq!(resolve_user(&dir, "carol").await.unwrap().id, 1);
        assert_eq!(resolve_user(&dir, "woman").await.unwrap().id, 2);
        assert_eq!(resolve_user(&dir, "prince").await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = directory(&[]).await;
        assert!(matches!(
            resolve_user(&dir, "anyone").await,
            Err(AwardError::NameNotFound { .. })
        ));
    }
}
