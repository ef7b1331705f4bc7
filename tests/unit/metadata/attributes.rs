use super::*;
use crate::{
    catalog::model::{Element, Layer},
    compose::choice::Choice,
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
    let mut shadow = layer("shadow", &["soft"]);
    shadow.artwork_only = true;
    let mut rarity = layer("rarity", &["common", "legendary"]);
    rarity.metadata_only = true;
    let mut eyes = layer("eyes", &["snorkel", "basic"]);
    eyes.display_name = "Eye Wear".to_string();
    LayerCatalog::new(vec![layer("bg", &["A"]), shadow, eyes, rarity])
}

fn select_all(cat: &LayerCatalog, picks: &[(&str, &str)]) -> ChoiceSet {
    picks
        .iter()
        .map(|(l, e)| {
            let layer = cat.layer(l).unwrap();
            Choice::from_element(layer, layer.element_by_name(e).unwrap())
        })
        .collect()
}

#[test]
fn projects_in_catalog_order_without_artwork_only_layers() {
    let cat = catalog();
    let cs = select_all(
        &cat,
        &[("rarity", "legendary"), ("eyes", "snorkel"), ("shadow", "soft"), ("bg", "A")],
    );
    let attrs = project(&cs, &cat, &BTreeMap::new());
    let pairs: Vec<(&str, &str)> = attrs
        .iter()
        .map(|a| (a.trait_type.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("bg", "A"), ("Eye Wear", "snorkel"), ("rarity", "legendary")]
    );
}

#[test]
fn labels_replace_values_and_invert_for_replay() {
    let cat = catalog();
    let labels: BTreeMap<String, String> =
        [("snorkel".to_string(), "Deep Diver".to_string())].into();
    let cs = select_all(
        &cat,
        &[("rarity", "common"), ("eyes", "snorkel"), ("shadow", "soft"), ("bg", "A")],
    );
    let attrs = project(&cs, &cat, &labels);
    assert_eq!(attrs[1].value, "Deep Diver");

    let preset = preset_from_attributes(&attrs, &cat, &labels);
    assert_eq!(preset.get("eyes").map(String::as_str), Some("snorkel"));
    assert_eq!(preset.get("bg").map(String::as_str), Some("A"));
    assert!(!preset.contains_key("shadow"));
}

#[test]
fn unknown_attributes_are_skipped() {
    let cat = catalog();
    let attrs = vec![
        Attribute {
            trait_type: "hats".to_string(),
            value: "cap".to_string(),
        },
        Attribute {
            trait_type: "bg".to_string(),
            value: "Z".to_string(),
        },
    ];
    assert!(preset_from_attributes(&attrs, &cat, &BTreeMap::new()).is_empty());
}

#[test]
fn accepts_trait_alias() {
    let a: Attribute = serde_json::from_str(r#"{"trait":"bg","value":"A"}"#).unwrap();
    assert_eq!(a.trait_type, "bg");
}
