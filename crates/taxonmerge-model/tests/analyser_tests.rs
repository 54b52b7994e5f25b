use std::collections::BTreeSet;
use taxonmerge_model::analyser::NameInput;
use taxonmerge_model::{
    AuthorComparator, BasicNameAnalyser, NameAnalyser, NameKey, NameType, NomenclaturalCode, Rank,
    TaxonFlag, TaxonomicType,
};

fn analyser() -> BasicNameAnalyser {
    BasicNameAnalyser::new().expect("analyser")
}

#[test]
fn test_fuzzy_authors_give_equal_keys() {
    let a = analyser();
    let k1 = a.key(Some(NomenclaturalCode::Botanical), "Acacia dealbata", Some("L."), Some(Rank::Species));
    let k2 = a.key(
        Some(NomenclaturalCode::Botanical),
        "Acacia dealbata",
        Some("Linnaeus"),
        Some(Rank::Species),
    );
    assert_eq!(k1, k2);
    assert_ne!(k1.author(), k2.author());
}

#[test]
fn test_rank_and_code_separate_keys() {
    let a = analyser();
    let species = a.key(Some(NomenclaturalCode::Zoological), "Canis lupus", None, Some(Rank::Species));
    let unranked = a.key(Some(NomenclaturalCode::Zoological), "Canis lupus", None, None);
    let uncoded = a.key(None, "Canis lupus", None, Some(Rank::Species));
    assert_ne!(species, unranked);
    assert_ne!(species, uncoded);
    assert_eq!(species.to_unranked_name_key(), unranked);
    assert!(uncoded < species);
}

#[test]
fn test_hybrids_cultivars_and_no_names() {
    let a = analyser();
    assert_eq!(
        a.analyse(&NameInput::new("Grevillea x gaudichaudii")).key.name_type(),
        NameType::Hybrid
    );
    let cultivar = a.analyse(&NameInput::new("Grevillea 'Robyn Gordon'"));
    assert_eq!(cultivar.key.name_type(), NameType::Cultivar);
    assert_eq!(cultivar.cultivar_epithet.as_deref(), Some("Robyn Gordon"));
    assert_eq!(a.analyse(&NameInput::new("1234 ?")).key.name_type(), NameType::NoName);
}

#[test]
fn test_status_and_code_drive_name_type() {
    let a = analyser();
    let placeholder = a.analyse(
        &NameInput::new("Acacia sp. Bracewell").status(Some(TaxonomicType::IncertaeSedis)),
    );
    assert_eq!(placeholder.key.name_type(), NameType::Placeholder);
    assert!(placeholder.genus.is_none());

    let virus = a.analyse(&NameInput::new("Tobacco mosaic virus").code(Some(NomenclaturalCode::Virus)));
    assert_eq!(virus.key.name_type(), NameType::Virus);

    let doubtful = a.analyse(&NameInput::new("Acacia cf. dealbata"));
    assert_eq!(doubtful.key.name_type(), NameType::Doubtful);
}

#[test]
fn test_autonym_flag_clears_author() {
    let a = analyser();
    let r = a.analyse(
        &NameInput::new("Acacia dealbata subsp. dealbata")
            .author(Some("Link"))
            .rank(Some(Rank::Subspecies))
            .code(Some(NomenclaturalCode::Botanical)),
    );
    assert!(r.key.is_autonym());
    assert!(r.key.author().is_none());
    assert!(!r.key.to_unranked_name_key().is_autonym());
}

#[test]
fn test_informal_patterns() {
    let a = analyser()
        .with_informal_patterns(&["Unidentified .*"])
        .expect("patterns");
    assert!(a.is_informal("Unidentified moth"));
    assert_eq!(
        a.analyse(&NameInput::new("Unidentified moth 2")).key.name_type(),
        NameType::Informal
    );
    assert!(BasicNameAnalyser::new()
        .expect("analyser")
        .with_informal_patterns(&["(unclosed"])
        .is_err());
}

#[test]
fn test_canonicalise_terms() {
    let a = analyser();
    assert_eq!(a.canonicalise_rank("").unwrap(), Rank::Unranked);
    assert_eq!(a.canonicalise_rank("Genus").unwrap(), Rank::Genus);
    assert!(a.canonicalise_rank("klingon").is_err());
    assert_eq!(a.canonicalise_taxonomic_type(" ").unwrap(), TaxonomicType::InferredUnplaced);
    assert_eq!(a.canonicalise_code("ICN").unwrap(), NomenclaturalCode::Botanical);
    assert_eq!(a.canonicalise_flag("synthetic").unwrap(), TaxonFlag::Synthetic);
}

#[test]
fn test_key_display_and_adjustment() {
    let cmp = AuthorComparator::default();
    let key = NameKey::new(
        &cmp,
        Some(NomenclaturalCode::Zoological),
        "CANIS LUPUS",
        Some("Linnaeus".to_string()),
        Rank::Species,
        NameType::Scientific,
        BTreeSet::new(),
    );
    assert_eq!(key.to_string(), "[ICZN:CANIS LUPUS,Linnaeus:species]");
    let adjusted = key.adjusted(&cmp, None, Some("CANIS FAMILIARIS"), Some(None), None, None);
    assert_eq!(adjusted.name(), "CANIS FAMILIARIS");
    assert!(adjusted.is_unauthored());
    assert_eq!(adjusted.code(), Some(NomenclaturalCode::Zoological));
}
