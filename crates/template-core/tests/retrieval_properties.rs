//! Property tests for the retrieval service over generated catalogs

use proptest::prelude::*;
use template_core::{
    extract_variables, Catalog, CatalogEntry, HashEmbedder, Metric, RetrievalError,
    RetrievalService,
};

fn word() -> impl Strategy<Value = String> {
    "[a-z]{4,10}"
}

fn entry_strategy() -> impl Strategy<Value = CatalogEntry> {
    (
        prop::collection::vec(word(), 1..8),
        prop::sample::select(vec!["request", "gratitude", "Complaint", "meeting"]),
        prop::collection::vec(word(), 0..4),
    )
        .prop_map(|(words, category, keywords)| CatalogEntry {
            template: format!("{} {{{{recipient}}}}", words.join(" ")),
            category: category.to_string(),
            keywords,
            description: String::new(),
        })
}

fn metric_strategy() -> impl Strategy<Value = Metric> {
    prop_oneof![Just(Metric::Cosine), Just(Metric::SquaredEuclidean)]
}

fn build(entries: Vec<CatalogEntry>, metric: Metric) -> RetrievalService {
    RetrievalService::build(
        Catalog::from_entries(entries).unwrap(),
        Box::new(HashEmbedder::default()),
        metric,
    )
    .unwrap()
}

proptest! {
    /// Property: k <= N yields exactly k distinct templates, best first
    #[test]
    fn search_returns_k_distinct_sorted(
        entries in prop::collection::vec(entry_strategy(), 1..10),
        query in prop::collection::vec(word(), 1..5),
        metric in metric_strategy(),
        k_seed in 0usize..100,
    ) {
        let n = entries.len();
        let k = k_seed % n + 1;
        let service = build(entries, metric);

        let results = service.search(&query.join(" "), k).unwrap();
        prop_assert_eq!(results.len(), k);

        let mut ids: Vec<usize> = results.iter().map(|r| r.template_id).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), k);
        prop_assert!(ids.iter().all(|&id| id < n));

        prop_assert!(results
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
        prop_assert!(results
            .iter()
            .all(|r| (-1.0..=1.0).contains(&r.similarity_score)));
    }

    /// Property: k > N yields the whole catalog
    #[test]
    fn search_caps_at_catalog_size(
        entries in prop::collection::vec(entry_strategy(), 1..10),
        extra in 1usize..20,
    ) {
        let n = entries.len();
        let service = build(entries, Metric::Cosine);
        prop_assert_eq!(service.search("recipient", n + extra).unwrap().len(), n);
    }

    /// Property: a record's indexed search text ranks it top-1 with similarity ~1
    #[test]
    fn record_matches_its_search_text(
        entries in prop::collection::vec(entry_strategy(), 1..10),
        metric in metric_strategy(),
        pick in 0usize..100,
    ) {
        let service = build(entries, metric);
        let record = service.template(pick % service.len()).unwrap().clone();

        let top = service.search(&record.search_text(), 1).unwrap();
        prop_assert!(top[0].similarity_score >= 0.999);

        let best = service.best_match(&record.search_text()).unwrap();
        prop_assert!(!best.is_none());
        prop_assert!(best.distance <= 0.002);
    }

    /// Property: category filtering ignores case
    #[test]
    fn filter_ignores_case(
        entries in prop::collection::vec(entry_strategy(), 1..10),
        category in prop::sample::select(vec!["request", "gratitude", "complaint", "meeting"]),
    ) {
        let service = build(entries, Metric::Cosine);
        let lower = service.filter_by_category(category);
        let upper = service.filter_by_category(&category.to_uppercase());
        prop_assert_eq!(&lower, &upper);
        prop_assert!(lower
            .iter()
            .all(|r| r.category.eq_ignore_ascii_case(category)));
    }

    /// Property: categories are sorted and unique
    #[test]
    fn categories_sorted_unique(entries in prop::collection::vec(entry_strategy(), 0..10)) {
        let service = build(entries, Metric::Cosine);
        let categories = service.list_categories();
        prop_assert!(categories.windows(2).all(|w| w[0] < w[1]));
    }

    /// Property: every extracted name occurs as a placeholder exactly once in the output
    #[test]
    fn extracted_variables_are_distinct_placeholders(
        names in prop::collection::vec("[a-z_]{1,8}", 0..6),
        filler in word(),
    ) {
        let text = names
            .iter()
            .map(|n| format!("{} {{{{{}}}}}", filler, n))
            .collect::<Vec<_>>()
            .join(" ");

        let vars = extract_variables(&text);
        let mut expected: Vec<String> = Vec::new();
        for name in &names {
            if !expected.contains(name) {
                expected.push(name.clone());
            }
        }
        prop_assert_eq!(&vars, &expected);
        let all_wrapped = vars.iter().all(|v| text.contains(&format!("{{{{{}}}}}", v)));
        prop_assert!(all_wrapped);
    }
}

#[test]
fn empty_catalog_reports_empty_index() {
    let service = build(vec![], Metric::Cosine);
    assert!(service.is_empty());
    assert!(matches!(
        service.search("thanks", 3),
        Err(RetrievalError::EmptyIndex)
    ));
    assert!(service.best_match("thanks").unwrap().is_none());
    assert!(service.list_categories().is_empty());
}
