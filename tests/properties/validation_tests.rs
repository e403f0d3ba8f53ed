use proptest::prelude::*;

use skill_memory::core::validate_skill_id;
use skill_memory::search::HybridRetriever;
use skill_memory::test_utils::CorpusFixture;
use skill_memory::test_utils::fixtures::record;

proptest! {
    #[test]
    fn test_kebab_ids_accepted(id in "[a-z0-9][a-z0-9-]{0,30}") {
        prop_assert!(validate_skill_id(&id).is_ok());
    }

    #[test]
    fn test_uppercase_rejected(prefix in "[a-z]{0,5}", upper in "[A-Z]", suffix in "[a-z]{0,5}") {
        let id = format!("{prefix}{upper}{suffix}");
        prop_assert!(validate_skill_id(&id).is_err());
    }

    #[test]
    fn test_space_or_leading_hyphen_rejected(a in "[a-z]{1,5}", b in "[a-z]{1,5}") {
        let spaced = format!("{a} {b}");
        let leading = format!("-{a}");
        prop_assert!(validate_skill_id(&spaced).is_err());
        prop_assert!(validate_skill_id(&leading).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// More occurrences of a query term never lower a document's score
    /// relative to a document whose frequency is unchanged.
    #[test]
    fn test_lexical_monotonicity(extra in 1usize..6) {
        let fixture = CorpusFixture::lexical_only().unwrap();
        let base = "# Notes\nthe deploy pipeline runs canary checks before rollout";
        fixture.store.upsert(&record("doc-a", skill_memory::core::SkillKind::Skill, &["ops"], base)).unwrap();
        fixture.store.upsert(&record("doc-b", skill_memory::core::SkillKind::Skill, &["ops"], base)).unwrap();
        fixture.store.upsert(&record("filler", skill_memory::core::SkillKind::Skill, &["misc"], "# Other\nunrelated text about fonts")).unwrap();

        let retriever = HybridRetriever::new(std::sync::Arc::clone(&fixture.store));
        let score_of = |id: &str| -> f32 {
            retriever
                .search_lexical("canary", 10)
                .unwrap()
                .into_iter()
                .find(|hit| hit.record.skill_id == id)
                .map_or(0.0, |hit| hit.lexical_score)
        };
        let before = score_of("doc-a") - score_of("doc-b");

        let boosted = format!("{base}{}", " canary".repeat(extra));
        fixture.store.upsert(&record("doc-a", skill_memory::core::SkillKind::Skill, &["ops"], &boosted)).unwrap();
        let after = score_of("doc-a") - score_of("doc-b");

        prop_assert!(after >= before);
    }
}
