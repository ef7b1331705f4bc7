use serde_json::{Map, Value};

use crate::{
    compose::composer::Edition,
    config::model::{Creator, Network, ProjectConfig},
    foundation::core::EditionIndex,
    metadata::attributes::Attribute,
};

/// Value of the `compiler` field in Ethereum records.
pub const COMPILER: &str = concat!("layerloom ", env!("CARGO_PKG_VERSION"));

/// Per-edition metadata record in the target network's shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MetadataRecord {
    /// Candy Machine style record.
    Solana(SolanaRecord),
    /// ERC-721 style record.
    Ethereum(EthereumRecord),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Ethereum record; field order matches the written JSON.
pub struct EthereumRecord {
    /// `"{prefix} #{n}"`.
    pub name: String,
    /// Collection description.
    pub description: String,
    /// `"{base_uri}/{edition}.png"`.
    pub image: String,
    /// SHA-1 hex of the full DNA.
    pub dna: String,
    /// Edition number.
    pub edition: EditionIndex,
    /// Unix milliseconds.
    pub date: i64,
    /// Project-wide extra fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Projected attributes.
    pub attributes: Vec<Attribute>,
    /// Generator identification.
    pub compiler: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Solana record; field order matches the written JSON.
pub struct SolanaRecord {
    /// `"{prefix} #{n}"`.
    pub name: String,
    /// Collection symbol.
    pub symbol: String,
    /// Collection description.
    pub description: String,
    /// Royalty in basis points.
    pub seller_fee_basis_points: u32,
    /// Image file name next to the record.
    pub image: String,
    /// Marketplace link.
    pub external_url: String,
    /// Edition number.
    pub edition: EditionIndex,
    /// Project-wide extra fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Projected attributes.
    pub attributes: Vec<Attribute>,
    /// Files, category and creators.
    pub properties: SolanaProperties,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// `properties` block of a Solana record.
pub struct SolanaProperties {
    /// Attached files.
    pub files: Vec<SolanaFile>,
    /// Always `"image"`.
    pub category: String,
    /// Royalty split.
    pub creators: Vec<Creator>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One attached file.
pub struct SolanaFile {
    /// File name.
    pub uri: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime: String,
}

/// Number shown in the record name: the edition number plus one, on every network.
pub fn display_number(index: EditionIndex) -> u64 {
    index.0 + 1
}

impl MetadataRecord {
    /// Build the record for `edition` stamped with `date_ms`.
    pub fn for_edition(project: &ProjectConfig, edition: &Edition, date_ms: i64) -> Self {
        let name = format!(
            "{} #{}",
            project.name_prefix,
            display_number(edition.index)
        );
        match project.network {
            Network::Eth => Self::Ethereum(EthereumRecord {
                name,
                description: project.description.clone(),
                image: format!(
                    "{}/{}.png",
                    project.base_uri.trim_end_matches('/'),
                    edition.index
                ),
                dna: edition.dna.digest(),
                edition: edition.index,
                date: date_ms,
                extra: project.extra_metadata.clone(),
                attributes: edition.attributes.clone(),
                compiler: COMPILER.to_string(),
            }),
            Network::Sol => {
                let image = format!("{}.png", edition.index);
                Self::Solana(SolanaRecord {
                    name,
                    symbol: project.solana.symbol.clone(),
                    description: project.description.clone(),
                    seller_fee_basis_points: project.solana.seller_fee_basis_points,
                    image: image.clone(),
                    external_url: project.solana.external_url.clone(),
                    edition: edition.index,
                    extra: project.extra_metadata.clone(),
                    attributes: edition.attributes.clone(),
                    properties: SolanaProperties {
                        files: vec![SolanaFile {
                            uri: image,
                            mime: "image/png".to_string(),
                        }],
                        category: "image".to_string(),
                        creators: project.solana.creators.clone(),
                    },
                })
            }
        }
    }

    /// Edition number.
    pub fn edition(&self) -> EditionIndex {
        match self {
            Self::Solana(r) => r.edition,
            Self::Ethereum(r) => r.edition,
        }
    }

    /// Attributes in catalog order.
    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::Solana(r) => &r.attributes,
            Self::Ethereum(r) => &r.attributes,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/record.rs"]
mod tests;
