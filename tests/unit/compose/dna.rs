use std::sync::Arc;

use super::*;
use crate::{
    catalog::model::{Element, Layer},
    compose::strategy::StrategySpec,
};

fn layer(name: &str, names: &[&str]) -> Layer {
    Layer::new(
        name,
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Element::new(i as u32, *n, format!("{n}.png"), 1.0))
            .collect(),
    )
}

fn catalog() -> LayerCatalog {
    let mut eyes = layer("eyes", &["basic", "snorkel"]);
    eyes.bypass_uniqueness = true;
    LayerCatalog::new(vec![
        layer("bg", &["A", "B"]),
        layer("body", &["blue", "red"]),
        eyes,
        layer("mouth", &["grin", "smile"]),
    ])
}

fn pick(cat: &LayerCatalog, picks: &[(&str, &str)]) -> ChoiceSet {
    picks
        .iter()
        .map(|(l, e)| {
            let layer = cat.layer(l).unwrap();
            Choice::from_element(layer, layer.element_by_name(e).unwrap())
        })
        .collect()
}

fn order(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn encodes_tokens_in_draw_order_with_bypass_suffix() {
    let cat = catalog();
    let cs = pick(
        &cat,
        &[("bg", "B"), ("body", "red"), ("eyes", "snorkel"), ("mouth", "grin")],
    );
    let dna = encode(
        &cs,
        &order(&["bg", "body", "eyes", "mouth"]),
        &StrategyRegistry::new(),
    )
    .unwrap();
    assert_eq!(
        dna.as_str(),
        "1:B.png~1:red.png~1:snorkel.png?bypassUniqueness=true~0:grin.png"
    );

    let reordered = encode(
        &cs,
        &order(&["mouth", "eyes", "body", "bg"]),
        &StrategyRegistry::new(),
    )
    .unwrap();
    assert_eq!(
        reordered.as_str(),
        "0:grin.png~1:snorkel.png?bypassUniqueness=true~1:red.png~1:B.png"
    );
}

#[test]
fn decode_inverts_encode_for_any_order() {
    let cat = catalog();
    let cs = pick(
        &cat,
        &[("bg", "A"), ("body", "blue"), ("eyes", "basic"), ("mouth", "smile")],
    );
    for o in [
        order(&["bg", "body", "eyes", "mouth"]),
        order(&["eyes", "bg", "mouth", "body"]),
    ] {
        let dna = encode(&cs, &o, &StrategyRegistry::new()).unwrap();
        assert_eq!(decode(&dna, &cat, &o).unwrap(), cs);
    }
}

#[test]
fn uniqueness_key_drops_bypass_tokens() {
    let cat = catalog();
    let o = order(&["bg", "body", "eyes", "mouth"]);
    let a = pick(
        &cat,
        &[("bg", "A"), ("body", "blue"), ("eyes", "basic"), ("mouth", "grin")],
    );
    let b = pick(
        &cat,
        &[("bg", "A"), ("body", "blue"), ("eyes", "snorkel"), ("mouth", "grin")],
    );
    let da = encode(&a, &o, &StrategyRegistry::new()).unwrap();
    let db = encode(&b, &o, &StrategyRegistry::new()).unwrap();
    assert_ne!(da, db);
    assert_eq!(da.uniqueness_key(), db.uniqueness_key());
    assert_eq!(da.uniqueness_key(), "0:A.png~0:blue.png~0:grin.png");
}

#[test]
fn strategies_override_encoded_locator() {
    let cat = catalog();
    let mut reg = StrategyRegistry::new();
    reg.register_variant(
        "mouth",
        "grin",
        Arc::new(StrategySpec::template("grin-{body}.png")),
    );
    let cs = pick(
        &cat,
        &[("bg", "A"), ("body", "red"), ("eyes", "basic"), ("mouth", "grin")],
    );
    let o = order(&["bg", "body", "eyes", "mouth"]);
    let dna = encode(&cs, &o, &reg).unwrap();
    assert!(dna.as_str().ends_with("~0:grin-red.png"));

    let decoded = decode(&dna, &cat, &o).unwrap();
    let mouth = decoded.get("mouth").unwrap();
    assert_eq!(mouth.element_name, "grin");
    assert_eq!(mouth.locator, "grin-red.png");
}

#[test]
fn encode_rejects_incomplete_order() {
    let cat = catalog();
    let cs = pick(&cat, &[("bg", "A"), ("body", "red")]);
    assert!(encode(&cs, &order(&["bg"]), &StrategyRegistry::new()).is_err());
    assert!(encode(&cs, &order(&["bg", "eyes"]), &StrategyRegistry::new()).is_err());
}

#[test]
fn decode_reports_malformed_input() {
    let cat = catalog();
    let o = order(&["bg", "body"]);
    for raw in ["0:A.png", "0:A.png~x:red.png", "0:A.png~1", "0:A.png~9:red.png"] {
        let err = decode(&Dna::from_raw(raw), &cat, &o).unwrap_err();
        assert!(matches!(err, LoomError::Validation(_)), "{raw}: {err}");
    }
}

#[test]
fn parse_and_digest() {
    assert!(Dna::parse("0:a.png~1:b.png?bypassUniqueness=true").is_ok());
    assert!(Dna::parse("nope").is_err());

    let dna = Dna::from_raw("0:a.png");
    let hex = dna.digest();
    assert_eq!(hex.len(), 40);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(hex, Dna::from_raw("0:a.png").digest());
    assert_ne!(hex, Dna::from_raw("0:b.png").digest());
}
