use chrono::NaiveDate;
use proptest::prelude::*;

use skill_memory::analytics::find_duplicates;
use skill_memory::core::{SkillKind, SkillRecord};
use skill_memory::search::{Embedder, HashEmbedder, cosine_similarity};

fn vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, 1..32)
}

fn corpus() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z]{1,8}", "[a-z ]{0,60}"), 0..8)
}

fn records(entries: &[(String, String)]) -> Vec<SkillRecord> {
    entries
        .iter()
        .enumerate()
        .map(|(n, (tag, body))| {
            SkillRecord::new(
                format!("skill-{n}"),
                SkillKind::Skill,
                vec![tag.clone(), "shared".to_string()],
                "proj",
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                body.clone(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn test_hash_embedding_deterministic(text in ".*") {
        let embedder = HashEmbedder::new(64);
        prop_assert_eq!(embedder.embed(&text).unwrap(), embedder.embed(&text).unwrap());
    }

    #[test]
    fn test_hash_embedding_length(text in ".*", dim in 1usize..256usize) {
        let embedder = HashEmbedder::new(dim);
        prop_assert_eq!(embedder.embed(&text).unwrap().len(), dim);
    }

    #[test]
    fn test_cosine_self_similarity(v in vector()) {
        prop_assume!(v.iter().any(|x| x.abs() > 1e-3));
        prop_assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_symmetric_and_bounded(a in vector(), b in vector()) {
        let ab = cosine_similarity(&a, &b);
        prop_assert_eq!(ab, cosine_similarity(&b, &a));
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_cosine_with_zero_vector(v in vector()) {
        let zero = vec![0.0; v.len()];
        prop_assert_eq!(cosine_similarity(&v, &zero), 0.0);
    }

    #[test]
    fn test_dedup_is_deterministic(entries in corpus(), threshold in 0.0f32..1.0) {
        let corpus = records(&entries);
        let first = find_duplicates(&corpus, threshold);
        let second = find_duplicates(&corpus, threshold);
        prop_assert_eq!(&first, &second);

        let mut reversed = corpus.clone();
        reversed.reverse();
        prop_assert_eq!(first, find_duplicates(&reversed, threshold));
    }
}
