use super::*;

#[test]
fn admitted_dna_is_no_longer_unique() {
    let mut reg = UniquenessRegistry::new();
    let dna = Dna::from_raw("0:a.png~1:b.png");
    assert!(reg.is_unique(&dna));
    assert!(reg.admit(&dna));
    assert!(!reg.is_unique(&dna));
    assert!(!reg.admit(&dna));
    assert_eq!(reg.len(), 1);
}

#[test]
fn bypass_only_differences_are_duplicates() {
    let mut reg = UniquenessRegistry::new();
    reg.admit(&Dna::from_raw("0:a.png~1:x.png?bypassUniqueness=true~1:b.png"));
    assert!(!reg.is_unique(&Dna::from_raw(
        "0:a.png~0:y.png?bypassUniqueness=true~1:b.png"
    )));
    assert!(reg.is_unique(&Dna::from_raw(
        "0:a.png~0:y.png?bypassUniqueness=true~0:b.png"
    )));
    assert!(reg.contains_key("0:a.png~1:b.png"));
}

#[test]
fn comparison_is_exact_string_equality() {
    let mut reg = UniquenessRegistry::new();
    reg.admit(&Dna::from_raw("0:a.png~1:b.png"));
    // same traits, different draw order: a distinct key
    assert!(reg.is_unique(&Dna::from_raw("1:b.png~0:a.png")));
    assert!(!reg.is_empty());
}
