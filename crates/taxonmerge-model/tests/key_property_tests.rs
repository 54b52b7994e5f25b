use proptest::prelude::*;
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use taxonmerge_model::{AuthorComparator, NameKey, NameType, NomenclaturalCode, Rank, TaxonFlag};

fn code() -> impl Strategy<Value = Option<NomenclaturalCode>> {
    proptest::option::of(proptest::sample::select(NomenclaturalCode::ALL.to_vec()))
}

fn rank() -> impl Strategy<Value = Rank> {
    proptest::sample::select(Rank::ALL.to_vec())
}

fn name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z]{2,10}( [A-Z]{2,10}){0,2}").unwrap()
}

fn author() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(proptest::string::string_regex("[A-Z][a-z]{1,8}(, 1[7-9][0-9]{2})?").unwrap())
}

fn flags() -> impl Strategy<Value = BTreeSet<TaxonFlag>> {
    proptest::collection::btree_set(
        proptest::sample::select(vec![TaxonFlag::Autonym, TaxonFlag::Synthetic]),
        0..=2,
    )
}

prop_compose! {
    fn name_key()(code in code(), name in name(), author in author(), rank in rank(), flags in flags()) -> NameKey {
        NameKey::new(&AuthorComparator::default(), code, name, author, rank, NameType::Scientific, flags)
    }
}

fn hash_of(key: &NameKey) -> u64 {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    h.finish()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn to_name_key_is_idempotent(key in name_key()) {
        let once = key.to_name_key();
        let twice = once.to_name_key();
        prop_assert_eq!(&once, &twice);
        prop_assert!(twice.author().is_none());
        prop_assert!(!twice.is_autonym());
    }

    #[test]
    fn unranked_key_has_no_rank_or_author(key in name_key()) {
        let unranked = key.to_unranked_name_key();
        prop_assert_eq!(unranked.rank(), Rank::Unranked);
        prop_assert!(unranked.author().is_none());
        prop_assert_eq!(unranked.code(), key.code());
    }

    #[test]
    fn uncoded_key_drops_code(key in name_key()) {
        let bare = key.to_uncoded_name_key();
        prop_assert!(bare.is_uncoded());
        prop_assert!(bare.is_unranked());
        prop_assert_eq!(bare.name(), key.name());
    }

    #[test]
    fn equal_keys_hash_equally(a in name_key(), b in name_key()) {
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
        prop_assert_eq!(a == b, a.cmp(&b) == std::cmp::Ordering::Equal);
    }
}
