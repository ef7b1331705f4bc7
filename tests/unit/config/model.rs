use super::*;
use serde_json::json;

fn minimal() -> serde_json::Value {
    json!({
        "name_prefix": "Loom",
        "layer_configurations": [
            {
                "grow_edition_size_to": 5,
                "layers_order": [
                    { "name": "bg" },
                    { "name": "eyes" },
                    { "name": "hats" }
                ]
            }
        ]
    })
}

fn parse(v: serde_json::Value) -> ProjectConfig {
    serde_json::from_value(v).unwrap()
}

fn config_error(v: serde_json::Value) -> String {
    match parse(v).validate().unwrap_err() {
        LoomError::Configuration(msg) => msg,
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn defaults_fill_in_optional_fields() {
    let p = parse(minimal());
    p.validate().unwrap();
    assert_eq!(p.format, Canvas::default());
    assert_eq!(p.network, Network::Eth);
    assert_eq!(p.rarity_delimiter, "#");
    assert!(p.background.generate);
    assert_eq!(p.unique_dna_tolerance, None);
    assert_eq!(p.total_editions(), 5);

    let opts = &p.layer_configurations[0].layers_order[0].options;
    assert_eq!(opts.opacity, 1.0);
    assert_eq!(opts.blend, BlendMode::SourceOver);
}

#[test]
fn from_reader_reports_serde_errors() {
    let err = ProjectConfig::from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(matches!(err, LoomError::Serde(_)));
    let ok = ProjectConfig::from_reader(minimal().to_string().as_bytes()).unwrap();
    assert_eq!(ok.name_prefix, "Loom");
}

#[test]
fn from_path_reports_missing_file_with_context() {
    let path = std::env::temp_dir().join(format!("layerloom_missing_{}.json", std::process::id()));
    let err = ProjectConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, LoomError::Other(_)));
    assert!(err.to_string().contains("open configuration"));
}

#[test]
fn full_block_parses_rules_exceptions_and_strategies() {
    let p = parse(json!({
        "name_prefix": "Loom",
        "network": "sol",
        "background": { "static": true, "default": "#112233" },
        "layer_configurations": [{
            "grow_edition_size_to": 3,
            "layers_order": [
                { "name": "bg" },
                { "name": "body" },
                { "name": "mouth", "options": {
                    "blend": "multiply",
                    "opacity": 0.7,
                    "variant_locator_overrides": { "grin": { "template": "grin-{body}.png" } }
                }},
                { "name": "eyes", "options": { "bypass_uniqueness": true } },
                { "name": "hats", "options": { "display_name": "Headwear" } }
            ],
            "conflict_rules": [
                { "resolution": "remove", "traits": [
                    { "trait": "eyes", "value": "snorkel" },
                    { "trait": "hats", "value": "*" }
                ]}
            ],
            "layering_exceptions": [
                { "exception": { "trait": "hats", "value": "astronaut" },
                  "layers": ["bg", "hats", "body", "mouth", "eyes"] }
            ],
            "invalid_combinations": [
                [ { "trait": "bg", "variant": "sol-season" }, { "trait": "eyes", "variant": "snorkel" } ]
            ]
        }]
    }));
    p.validate().unwrap();
    assert_eq!(p.network.first_edition(), 0);
    assert!(p.background.static_color);

    let block = &p.layer_configurations[0];
    let mouth = &block.layers_order[2];
    assert_eq!(mouth.options.blend, BlendMode::Multiply);
    let layer = mouth.to_layer(vec![Element::new(0, "grin", "grin.png", 1.0)]);
    assert_eq!(layer.display_name, "mouth");
    assert_eq!(layer.opacity, 0.7);
    let hats = block.layers_order[4].to_layer(Vec::new());
    assert_eq!(hats.display_name, "Headwear");
}

#[test]
fn edition_targets_must_grow() {
    let mut v = minimal();
    let block = v["layer_configurations"][0].clone();
    let mut second = block.clone();
    second["grow_edition_size_to"] = json!(5);
    v["layer_configurations"] = json!([block, second]);
    assert!(config_error(v).contains("layer configuration 1"));

    let mut zero = minimal();
    zero["layer_configurations"][0]["grow_edition_size_to"] = json!(0);
    assert!(parse(zero).validate().is_err());
}

#[test]
fn unknown_layer_references_are_rejected() {
    let mut v = minimal();
    v["layer_configurations"][0]["conflict_rules"] = json!([
        { "resolution": "remove", "traits": [
            { "trait": "mouth", "value": "grin" },
            { "trait": "hats", "value": "*" }
        ]}
    ]);
    assert!(config_error(v).contains("mouth"));

    let mut v = minimal();
    v["layer_configurations"][0]["layering_exceptions"] = json!([
        { "exception": { "trait": "eyes", "value": "x" }, "layers": ["bg", "eyes"] }
    ]);
    assert!(parse(v).validate().is_err());

    let mut v = minimal();
    v["layer_configurations"][0]["invalid_combinations"] =
        json!([[{ "trait": "nope", "variant": "x" }]]);
    assert!(config_error(v).contains("nope"));

    let mut v = minimal();
    v["layer_configurations"][0]["layers_order"][1]["options"] = json!({
        "static_locator_override": { "template": "{body}/{locator}" }
    });
    assert!(config_error(v).contains("body"));
}

#[test]
fn rule_shapes_are_checked() {
    let mut wildcard_trigger = minimal();
    wildcard_trigger["layer_configurations"][0]["conflict_rules"] = json!([
        { "resolution": "remove", "traits": [
            { "trait": "eyes", "value": "*" },
            { "trait": "hats", "value": "*" }
        ]}
    ]);
    assert!(config_error(wildcard_trigger).contains("wildcard"));

    let mut replace_all = minimal();
    replace_all["layer_configurations"][0]["conflict_rules"] = json!([
        { "resolution": "replace", "traits": [
            { "trait": "eyes", "value": "snorkel" },
            { "trait": "hats", "value": "*" }
        ]}
    ]);
    assert!(parse(replace_all).validate().is_err());
}

#[test]
fn global_settings_are_checked() {
    let mut v = minimal();
    v["unique_dna_tolerance"] = json!(0);
    assert!(config_error(v).contains("unique_dna_tolerance"));

    let mut v = minimal();
    v["name_prefix"] = json!("  ");
    assert!(parse(v).validate().is_err());

    let mut v = minimal();
    v["format"] = json!({ "width": 0, "height": 10 });
    assert!(parse(v).validate().is_err());

    let mut v = minimal();
    v["layer_configurations"][0]["layers_order"][0]["options"] =
        json!({ "metadata_only": true, "artwork_only": true });
    assert!(parse(v).validate().is_err());

    let mut v = minimal();
    v["layer_configurations"][0]["layers_order"][2] = json!({ "name": "bg" });
    assert!(config_error(v).contains("declared twice"));
}
