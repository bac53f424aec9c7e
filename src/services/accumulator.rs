/// Folding rounds into a session
///
/// Dedup is by catalog id while the exclusion set is by title string. A
/// near-duplicate title ("Amelie" vs "Amélie") therefore slips past the
/// generator-side exclusion, and is only caught here if it resolves to the
/// same catalog id.
use std::collections::HashSet;

use crate::models::{MergeMode, ResolvedItem, Session};

/// Merges `new_round` into `session` and returns the updated session
pub fn merge(session: Session, new_round: Vec<ResolvedItem>, mode: MergeMode) -> Session {
    match mode {
        MergeMode::Replace => replace(new_round),
        MergeMode::Append => append(session, new_round),
    }
}

fn replace(new_round: Vec<ResolvedItem>) -> Session {
    let mut session = Session::new();
    let mut seen = HashSet::new();

    for item in new_round {
        session.exclusion_set.insert(item.title.clone());
        if seen.insert(item.catalog_id) {
            session.accumulated_items.push(item);
        }
    }

    session.rounds = 1;
    session
}

fn append(mut session: Session, new_round: Vec<ResolvedItem>) -> Session {
    let mut seen: HashSet<u64> = session
        .accumulated_items
        .iter()
        .map(|item| item.catalog_id)
        .collect();
    let mut skipped = 0usize;

    for item in new_round {
        session.exclusion_set.insert(item.title.clone());
        if seen.insert(item.catalog_id) {
            session.accumulated_items.push(item);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Dropped items already shown in this session");
    }

    session.rounds += 1;
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExclusionSet;

    fn item(id: u64, title: &str) -> ResolvedItem {
        ResolvedItem {
            catalog_id: id,
            title: title.to_string(),
            original_title: title.to_string(),
            overview: String::new(),
            poster_url: None,
            backdrop_url: None,
            release_date: "2000-01-01".to_string(),
            vote_average: 7.0,
            vote_count: 10,
            reason: String::new(),
        }
    }

    fn ids(session: &Session) -> Vec<u64> {
        session.accumulated_items.iter().map(|i| i.catalog_id).collect()
    }

    #[test]
    fn test_replace_seeds_items_and_exclusions() {
        let session = merge(
            Session::new(),
            vec![item(1, "Heat"), item(2, "Ronin")],
            MergeMode::Replace,
        );

        assert_eq!(ids(&session), vec![1, 2]);
        assert_eq!(session.exclusion_titles(), vec!["Heat", "Ronin"]);
        assert_eq!(session.rounds, 1);
    }

    #[test]
    fn test_replace_discards_previous_items() {
        let first = merge(Session::new(), vec![item(1, "Heat")], MergeMode::Replace);
        let second = merge(first, vec![item(2, "Ronin")], MergeMode::Replace);

        assert_eq!(ids(&second), vec![2]);
        assert_eq!(second.exclusion_titles(), vec!["Ronin"]);
    }

    #[test]
    fn test_replace_dedups_within_round() {
        let session = merge(
            Session::new(),
            vec![item(7, "Solaris"), item(7, "Solaris (1972)")],
            MergeMode::Replace,
        );

        assert_eq!(ids(&session), vec![7]);
        assert_eq!(session.exclusion_titles(), vec!["Solaris", "Solaris (1972)"]);
    }

    #[test]
    fn test_append_skips_already_shown_catalog_ids() {
        let round1 = merge(
            Session::new(),
            vec![item(1, "Heat"), item(2, "Ronin")],
            MergeMode::Replace,
        );
        // Generator proposed a near-duplicate title that resolves to the same id
        let round2 = merge(
            round1,
            vec![item(3, "Thief"), item(1, "Heat (1995)")],
            MergeMode::Append,
        );

        assert_eq!(ids(&round2), vec![1, 2, 3]);
        assert_eq!(round2.rounds, 2);
    }

    #[test]
    fn test_append_preserves_round_order_after_existing_items() {
        let round1 = merge(Session::new(), vec![item(5, "E")], MergeMode::Replace);
        let round2 = merge(
            round1,
            vec![item(9, "I"), item(2, "B"), item(7, "G")],
            MergeMode::Append,
        );

        assert_eq!(ids(&round2), vec![5, 9, 2, 7]);
    }

    #[test]
    fn test_exclusion_set_grows_monotonically() {
        let round1 = merge(
            Session::new(),
            vec![item(1, "Heat"), item(2, "Ronin")],
            MergeMode::Replace,
        );
        let before: ExclusionSet = round1.exclusion_set.clone();

        let round2 = merge(round1, vec![item(3, "Thief")], MergeMode::Append);
        assert!(round2.exclusion_set.is_superset_of(&before));
        assert_eq!(round2.exclusion_titles(), vec!["Heat", "Ronin", "Thief"]);

        let round3 = merge(round2.clone(), vec![], MergeMode::Append);
        assert!(round3.exclusion_set.is_superset_of(&round2.exclusion_set));
        assert_eq!(round3.rounds, 3);
    }

    #[test]
    fn test_append_records_titles_of_duplicate_ids() {
        let round1 = merge(Session::new(), vec![item(1, "Amelie")], MergeMode::Replace);
        let round2 = merge(round1, vec![item(1, "Amélie")], MergeMode::Append);

        assert_eq!(ids(&round2), vec![1]);
        assert!(round2.exclusion_set.contains("Amélie"));
    }

    #[test]
    fn test_catalog_ids_stay_unique_across_many_rounds() {
        let mut session = merge(Session::new(), vec![item(1, "A")], MergeMode::Replace);
        for round in 0..4u64 {
            session = merge(
                session,
                vec![item(round + 1, "dup"), item(100 + round, "new")],
                MergeMode::Append,
            );
        }

        let mut all = ids(&session);
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
