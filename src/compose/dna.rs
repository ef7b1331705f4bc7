use sha1::Digest;

use crate::{
    catalog::model::LayerCatalog,
    compose::choice::{Choice, ChoiceSet},
    compose::strategy::StrategyRegistry,
    foundation::core::ElementId,
    foundation::error::{LoomError, LoomResult},
};

/// Separator between per-layer tokens.
pub const DNA_DELIMITER: char = '~';
/// Separator between element id and locator inside a token.
pub const ID_SEPARATOR: char = ':';
/// Start of a token's option suffix.
pub const QUERY_PREFIX: char = '?';
/// Option suffix marking a token as excluded from the uniqueness key.
pub const BYPASS_QUERY: &str = "bypassUniqueness=true";

/// Canonical identifier of one edition's resolved choice set and draw order.
///
/// Grammar: `token ("~" token)*` with `token = id ":" locator ["?bypassUniqueness=true"]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Dna(String);

/// Parsed view of one DNA token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DnaToken<'a> {
    /// Element id within the positional layer.
    pub element_id: ElementId,
    /// Locator with any option suffix stripped.
    pub locator: &'a str,
    /// Whether the token carries the bypass option.
    pub bypass_uniqueness: bool,
}

impl Dna {
    /// Wrap a raw DNA string without validating it; see [`Dna::parse`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse and validate a DNA string.
    pub fn parse(raw: &str) -> LoomResult<Self> {
        let dna = Self(raw.to_string());
        for token in dna.raw_tokens() {
            parse_token(token)?;
        }
        Ok(dna)
    }

    /// Raw DNA text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn raw_tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(DNA_DELIMITER)
    }

    /// Parsed tokens in draw order.
    pub fn tokens(&self) -> LoomResult<Vec<DnaToken<'_>>> {
        self.raw_tokens().map(parse_token).collect()
    }

    /// DNA with every bypass-tagged token removed and option suffixes stripped.
    ///
    /// Two editions are duplicates exactly when their keys are equal strings.
    pub fn uniqueness_key(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for token in self.raw_tokens() {
            let (body, query) = split_query(token);
            if query.is_some_and(has_bypass) {
                continue;
            }
            if !out.is_empty() {
                out.push(DNA_DELIMITER);
            }
            out.push_str(body);
        }
        out
    }

    /// Lowercase hex SHA-1 of the full DNA, as published in metadata records.
    pub fn digest(&self) -> String {
        let digest = sha1::Sha1::digest(self.0.as_bytes());
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

impl std::fmt::Display for Dna {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn split_query(token: &str) -> (&str, Option<&str>) {
    match token.split_once(QUERY_PREFIX) {
        Some((body, query)) => (body, Some(query)),
        None => (token, None),
    }
}

fn has_bypass(query: &str) -> bool {
    query.split('&').any(|opt| opt == BYPASS_QUERY)
}

fn parse_token(token: &str) -> LoomResult<DnaToken<'_>> {
    let (body, query) = split_query(token);
    let (id, locator) = body.split_once(ID_SEPARATOR).ok_or_else(|| {
        LoomError::validation(format!(
            "DNA token '{token}' is missing the '{ID_SEPARATOR}' separator"
        ))
    })?;
    let id: u32 = id
        .parse()
        .map_err(|_| LoomError::validation(format!("DNA token '{token}' has a non-numeric id")))?;
    if locator.is_empty() {
        return Err(LoomError::validation(format!(
            "DNA token '{token}' has an empty locator"
        )));
    }
    Ok(DnaToken {
        element_id: ElementId(id),
        locator,
        bypass_uniqueness: query.is_some_and(has_bypass),
    })
}

/// Encode `choices` into DNA, one token per layer of `order`.
///
/// Locators go through `strategies` with the full choice set in view.
pub fn encode(
    choices: &ChoiceSet,
    order: &[String],
    strategies: &StrategyRegistry,
) -> LoomResult<Dna> {
    if order.len() != choices.len() {
        return Err(LoomError::configuration(format!(
            "draw order has {} layers but the choice set has {}",
            order.len(),
            choices.len()
        )));
    }

    let mut out = String::new();
    for (pos, layer) in order.iter().enumerate() {
        let choice = choices.get(layer).ok_or_else(|| {
            LoomError::configuration(format!("draw order names layer '{layer}' with no choice"))
        })?;
        let locator = strategies.resolve_locator(choice, choices);
        if locator.contains(DNA_DELIMITER) || locator.contains(QUERY_PREFIX) {
            return Err(LoomError::configuration(format!(
                "locator '{locator}' for layer '{layer}' contains a reserved DNA character"
            )));
        }
        if pos > 0 {
            out.push(DNA_DELIMITER);
        }
        out.push_str(&format!("{}{ID_SEPARATOR}{locator}", choice.element_id));
        if choice.bypass_uniqueness {
            out.push(QUERY_PREFIX);
            out.push_str(BYPASS_QUERY);
        }
    }
    Ok(Dna(out))
}

/// Decode `dna` back into a choice set, matching tokens to `order` by position.
///
/// The recovered locator is the one written in the token.
pub fn decode(dna: &Dna, catalog: &LayerCatalog, order: &[String]) -> LoomResult<ChoiceSet> {
    let tokens = dna.tokens()?;
    if tokens.len() != order.len() {
        return Err(LoomError::validation(format!(
            "DNA has {} tokens but the draw order has {} layers",
            tokens.len(),
            order.len()
        )));
    }

    let mut out = ChoiceSet::new();
    for (token, layer_name) in tokens.iter().zip(order) {
        let layer = catalog.require(layer_name)?;
        let element = layer.element_by_id(token.element_id).ok_or_else(|| {
            LoomError::validation(format!(
                "layer '{}' has no element with id {}",
                layer.name, token.element_id
            ))
        })?;
        let choice = Choice {
            locator: token.locator.to_string(),
            bypass_uniqueness: token.bypass_uniqueness,
            ..Choice::from_element(layer, element)
        };
        if out.insert(choice).is_some() {
            return Err(LoomError::validation(format!(
                "draw order names layer '{layer_name}' twice"
            )));
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/dna.rs"]
mod tests;
