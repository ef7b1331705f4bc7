use super::*;
use crate::{
    catalog::model::{Element, Layer},
    compose::sampler::{FixedDraws, ReplaySampler, WeightedSampler},
    output::sink::InMemorySink,
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

fn scripted(values: &[f64]) -> WeightedSampler<FixedDraws> {
    WeightedSampler::new(FixedDraws::new(values.to_vec()))
}

struct RefusingSink;

impl EditionSink for RefusingSink {
    fn accept(&mut self, _edition: &Edition, _catalog: &LayerCatalog) -> LoomResult<()> {
        Err(LoomError::Other(anyhow::anyhow!("disk full")))
    }
}

#[test]
fn duplicate_attempts_are_retried_with_fresh_samples() {
    let plan = CompositionPlan::new(LayerCatalog::new(vec![layer("bg", &["A", "B"])]));
    let mut composer = TraitComposer::new();
    let mut sampler = scripted(&[0.0, 0.0, 0.9]);
    let mut sink = InMemorySink::new();

    let first = composer
        .compose_edition(EditionIndex(1), &plan, &mut sampler, &mut sink)
        .unwrap();
    assert_eq!(first.choices.element_name("bg"), Some("A"));

    let second = composer
        .compose_edition(EditionIndex(2), &plan, &mut sampler, &mut sink)
        .unwrap();
    assert_eq!(second.choices.element_name("bg"), Some("B"));
    assert_eq!(composer.rejected_attempts(), 1);
    assert_eq!(composer.registry().len(), 2);
    assert_eq!(sink.editions().len(), 2);
}

#[test]
fn tolerance_aborts_with_edition_and_attempts() {
    let plan = CompositionPlan::new(LayerCatalog::new(vec![layer("bg", &["A"])]));
    let mut composer = TraitComposer::new().with_failure_tolerance(Some(3));
    let mut sampler = scripted(&[0.0]);
    let mut sink = InMemorySink::new();

    composer
        .compose_edition(EditionIndex(1), &plan, &mut sampler, &mut sink)
        .unwrap();
    let err = composer
        .compose_edition(EditionIndex(2), &plan, &mut sampler, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        LoomError::ToleranceExceeded {
            edition: 2,
            attempts: 3
        }
    ));
    assert_eq!(composer.editions().len(), 1);
}

#[test]
fn invalid_combinations_are_rejected_and_retried() {
    let mut plan = CompositionPlan::new(LayerCatalog::new(vec![
        layer("eyes", &["snorkel", "basic"]),
        layer("hats", &["headphones", "cap"]),
    ]));
    plan.invalid_combinations = serde_json::from_value(serde_json::json!([[
        { "trait": "eyes", "variant": "snorkel" },
        { "trait": "hats", "variant": "headphones" }
    ]]))
    .unwrap();
    let mut composer = TraitComposer::new();
    let mut sampler = scripted(&[0.0, 0.0, 0.0, 0.9]);
    let mut sink = InMemorySink::new();

    let ed = composer
        .compose_edition(EditionIndex(1), &plan, &mut sampler, &mut sink)
        .unwrap();
    assert_eq!(ed.choices.element_name("eyes"), Some("snorkel"));
    assert_eq!(ed.choices.element_name("hats"), Some("cap"));
    assert_eq!(composer.rejected_attempts(), 1);
}

#[test]
fn rules_exceptions_and_attributes_flow_into_the_edition() {
    let mut plan = CompositionPlan::new(LayerCatalog::new(vec![
        layer("bg", &["A", "B"]),
        layer("hats", &["headphones", "none"]),
        layer("eyes", &["snorkel", "other"]),
    ]));
    plan.conflict_rules = serde_json::from_value(serde_json::json!([
        { "resolution": "remove", "traits": [
            { "trait": "eyes", "value": "snorkel" },
            { "trait": "hats", "value": "*" }
        ]}
    ]))
    .unwrap();
    plan.layering_exceptions = serde_json::from_value(serde_json::json!([
        { "exception": { "trait": "eyes", "value": "snorkel" },
          "layers": ["bg", "eyes", "hats"] }
    ]))
    .unwrap();

    let mut composer = TraitComposer::new();
    let mut sampler = scripted(&[0.0]);
    let mut sink = InMemorySink::new();
    let ed = composer
        .compose_edition(EditionIndex(7), &plan, &mut sampler, &mut sink)
        .unwrap();

    assert_eq!(ed.index, EditionIndex(7));
    assert_eq!(ed.choices.element_name("hats"), Some("none"));
    assert_eq!(ed.draw_order, vec!["bg", "eyes", "hats"]);
    assert_eq!(ed.dna.as_str(), "0:A.png~0:snorkel.png~1:none.png");
    let traits: Vec<&str> = ed.attributes.iter().map(|a| a.trait_type.as_str()).collect();
    assert_eq!(traits, vec!["bg", "hats", "eyes"]);
}

#[test]
fn nothing_is_admitted_when_the_sink_fails() {
    let plan = CompositionPlan::new(LayerCatalog::new(vec![layer("bg", &["A", "B"])]));
    let mut composer = TraitComposer::new();
    let mut sampler = scripted(&[0.0]);
    let err = composer
        .compose_edition(EditionIndex(1), &plan, &mut sampler, &mut RefusingSink)
        .unwrap_err();
    assert!(matches!(err, LoomError::Other(_)));
    assert!(composer.registry().is_empty());
    assert!(composer.editions().is_empty());
}

#[test]
fn exhaustion_is_fatal_not_retried() {
    let mut plan = CompositionPlan::new(LayerCatalog::new(vec![
        layer("eyes", &["snorkel"]),
        layer("hats", &["headphones"]),
    ]));
    plan.conflict_rules = serde_json::from_value(serde_json::json!([
        { "resolution": "replace", "traits": [
            { "trait": "eyes", "value": "snorkel" },
            { "trait": "hats", "value": ["headphones"] }
        ]}
    ]))
    .unwrap();
    let mut composer = TraitComposer::new();
    let err = composer
        .compose_edition(
            EditionIndex(1),
            &plan,
            &mut scripted(&[0.0]),
            &mut InMemorySink::new(),
        )
        .unwrap_err();
    assert!(matches!(err, LoomError::Exhaustion(_)));
    assert_eq!(composer.rejected_attempts(), 0);
}

#[test]
fn value_labels_reach_attributes() {
    let plan = CompositionPlan::new(LayerCatalog::new(vec![layer("bg", &["A"])]));
    let labels: BTreeMap<String, String> = [("A".to_string(), "Alpine".to_string())].into();
    let mut composer = TraitComposer::new().with_value_labels(labels);
    let ed = composer
        .compose_edition(
            EditionIndex(0),
            &plan,
            &mut scripted(&[0.0]),
            &mut InMemorySink::new(),
        )
        .unwrap();
    assert_eq!(ed.attributes[0].value, "Alpine");
}

#[test]
fn plan_decode_recovers_exception_order() {
    let mut plan = CompositionPlan::new(LayerCatalog::new(vec![
        layer("bg", &["A", "B"]),
        layer("hats", &["cap", "none"]),
        layer("eyes", &["snorkel", "other"]),
    ]));
    plan.layering_exceptions = serde_json::from_value(serde_json::json!([
        { "exception": { "trait": "eyes", "value": "snorkel" },
          "layers": ["bg", "eyes", "hats"] }
    ]))
    .unwrap();

    let mut composer = TraitComposer::new();
    let mut sink = InMemorySink::new();
    let mut sampler = scripted(&[0.0, 0.0, 0.0, 0.9, 0.9, 0.9]);
    for i in 1..=2 {
        let ed = composer
            .compose_edition(EditionIndex(i), &plan, &mut sampler, &mut sink)
            .unwrap()
            .clone();
        let (choices, order) = plan.decode(&ed.dna).unwrap();
        assert_eq!(choices, ed.choices);
        assert_eq!(order, ed.draw_order);
    }
    assert_eq!(composer.editions()[0].draw_order, vec!["bg", "eyes", "hats"]);
    assert_eq!(composer.editions()[1].draw_order, vec!["bg", "hats", "eyes"]);

    assert!(plan.decode(&Dna::from_raw("0:A.png~9:x.png~0:snorkel.png")).is_err());
}

#[test]
fn duplicate_replay_preset_is_retried_with_fresh_draws() {
    let plan = CompositionPlan::new(LayerCatalog::new(vec![layer("bg", &["A", "B", "C"])]));
    let preset = || BTreeMap::from([("bg".to_string(), "A".to_string())]);
    let mut sampler = ReplaySampler::new(scripted(&[0.9]))
        .with_preset(EditionIndex(1), preset())
        .with_preset(EditionIndex(2), preset());
    let mut composer = TraitComposer::new().with_failure_tolerance(Some(50));
    let mut sink = InMemorySink::new();

    let first = composer
        .compose_edition(EditionIndex(1), &plan, &mut sampler, &mut sink)
        .unwrap();
    assert_eq!(first.choices.element_name("bg"), Some("A"));

    let second = composer
        .compose_edition(EditionIndex(2), &plan, &mut sampler, &mut sink)
        .unwrap();
    assert_eq!(second.choices.element_name("bg"), Some("C"));
    assert_eq!(composer.rejected_attempts(), 1);
    assert_eq!(sampler.preset_count(), 1);
}
