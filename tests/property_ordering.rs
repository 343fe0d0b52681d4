// tests/property_ordering.rs

mod common;
use crate::common::record;

use std::collections::BTreeMap;

use assetflow::pipeline::{BucketCache, FileRecord, Orderer};
use assetflow::tasks::layout;
use proptest::prelude::*;

const STYLE_FILES: &[&str] = &[
    "app/styles/libs/normalize.css",
    "app/styles/libs/grid.css",
    "app/styles/css/reset.css",
    "app/styles/css/fonts.css",
    "app/styles/css/base.css",
    "app/styles/css/common.css",
    "app/styles/css/media.css",
    "app/styles/css/header.css",
    "app/styles/css/footer.css",
];

// A subset of the style files, in arbitrary order.
fn shuffled_styles() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(STYLE_FILES.to_vec(), 0..=STYLE_FILES.len())
        .prop_flat_map(|subset| Just(subset).prop_shuffle())
}

fn paths(records: &[FileRecord]) -> Vec<String> {
    records.iter().map(|r| r.path.clone()).collect()
}

proptest! {
    #[test]
    fn order_is_independent_of_enumeration_order(files in shuffled_styles()) {
        let orderer = Orderer::new(layout::STYLE_ORDER).unwrap();

        let forward: Vec<FileRecord> = files.iter().map(|p| record(p, p)).collect();
        let mut sorted_input = forward.clone();
        sorted_input.sort_by(|a, b| a.path.cmp(&b.path));

        let a = orderer.order(forward);
        let b = orderer.order(sorted_input);

        // Unmatched files keep input order, so only compare the ranked prefix.
        let ranked = a.iter().filter(|r| orderer.rank(&r.path).is_some()).count();
        prop_assert_eq!(&paths(&a)[..ranked], &paths(&b)[..ranked]);
        prop_assert_eq!(a.len(), files.len());
    }

    #[test]
    fn ranks_never_decrease_along_the_output(files in shuffled_styles()) {
        let orderer = Orderer::new(layout::STYLE_ORDER).unwrap();
        let out = orderer.order(files.iter().map(|p| record(p, p)).collect());

        let ranks: Vec<usize> = out
            .iter()
            .map(|r| orderer.rank(&r.path).unwrap_or(usize::MAX))
            .collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn ordering_twice_changes_nothing(files in shuffled_styles()) {
        let orderer = Orderer::new(layout::STYLE_ORDER).unwrap();
        let once = orderer.order(files.iter().map(|p| record(p, p)).collect());
        let twice = orderer.order(once.clone());
        prop_assert_eq!(paths(&once), paths(&twice));
    }

    #[test]
    fn incremental_remember_matches_a_full_pass(
        changed in proptest::sample::subsequence(STYLE_FILES.to_vec(), 0..=STYLE_FILES.len())
    ) {
        let cache = BucketCache::new();
        let first: Vec<FileRecord> = STYLE_FILES.iter().map(|p| record(p, "v1")).collect();
        cache.remember("styles", first);

        let updates: Vec<FileRecord> = changed.iter().map(|p| record(p, "v2")).collect();
        let merged = cache.remember("styles", updates);

        let expected: BTreeMap<String, String> = STYLE_FILES
            .iter()
            .map(|p| {
                let v = if changed.contains(p) { "v2" } else { "v1" };
                (p.to_string(), v.to_string())
            })
            .collect();
        let actual: BTreeMap<String, String> =
            merged.iter().map(|r| (r.path.clone(), r.text())).collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(paths(&merged), STYLE_FILES.iter().map(|p| p.to_string()).collect::<Vec<_>>());
    }
}
