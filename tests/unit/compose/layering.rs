use super::*;
use crate::{compose::choice::Choice, foundation::core::ElementId};

fn choices(picks: &[(&str, &str)]) -> ChoiceSet {
    picks
        .iter()
        .map(|(layer, name)| Choice {
            layer: layer.to_string(),
            element_id: ElementId(0),
            element_name: name.to_string(),
            locator: format!("{name}.png"),
            bypass_uniqueness: false,
        })
        .collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn exception(trait_name: &str, value: &str, layers: &[&str]) -> LayeringException {
    LayeringException {
        exception: ExceptionTrigger {
            trait_name: trait_name.to_string(),
            value: value.to_string(),
        },
        layers: names(layers),
    }
}

#[test]
fn no_match_returns_default_order() {
    let default = names(&["bg", "hats", "eyes"]);
    let cs = choices(&[("bg", "a"), ("hats", "cap"), ("eyes", "basic")]);
    let ex = vec![exception("eyes", "snorkel", &["bg", "eyes", "hats"])];
    assert_eq!(order_layers(&cs, &default, &ex).unwrap(), default);
    assert_eq!(order_layers(&cs, &default, &[]).unwrap(), default);
}

#[test]
fn first_matching_exception_wins() {
    let default = names(&["bg", "hats", "eyes"]);
    let cs = choices(&[("bg", "a"), ("hats", "astronaut"), ("eyes", "snorkel")]);
    let ex = vec![
        exception("hats", "flower", &["hats", "bg", "eyes"]),
        exception("eyes", "snorkel", &["bg", "eyes", "hats"]),
        exception("hats", "astronaut", &["eyes", "bg", "hats"]),
    ];
    assert_eq!(
        order_layers(&cs, &default, &ex).unwrap(),
        names(&["bg", "eyes", "hats"])
    );
}

#[test]
fn mismatched_layer_set_is_a_configuration_error() {
    let default = names(&["bg", "hats", "eyes"]);
    let cs = choices(&[("bg", "a"), ("hats", "cap"), ("eyes", "snorkel")]);

    let missing = vec![exception("eyes", "snorkel", &["bg", "eyes"])];
    assert!(matches!(
        order_layers(&cs, &default, &missing).unwrap_err(),
        LoomError::Configuration(_)
    ));

    let duplicated = vec![exception("eyes", "snorkel", &["bg", "eyes", "eyes"])];
    assert!(order_layers(&cs, &default, &duplicated).is_err());

    let foreign = vec![exception("eyes", "snorkel", &["bg", "eyes", "mouth"])];
    assert!(order_layers(&cs, &default, &foreign).is_err());
}

#[test]
fn deserializes_name_objects_and_variant_alias() {
    let ex: LayeringException = serde_json::from_value(serde_json::json!({
        "exception": { "trait": "hats", "variant": "astronaut" },
        "layers": [{ "name": "bg" }, "eyes", { "name": "hats" }]
    }))
    .unwrap();
    assert_eq!(ex.exception.value, "astronaut");
    assert_eq!(ex.layers, names(&["bg", "eyes", "hats"]));
}
