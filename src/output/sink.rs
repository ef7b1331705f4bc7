use crate::{
    catalog::model::LayerCatalog, compose::composer::Edition, foundation::error::LoomResult,
};

/// Sink contract for consuming accepted editions.
///
/// Ordering contract: `accept` is called once per edition, in generation order, after the edition
/// passed validation and before it is admitted to the uniqueness registry. An error from `accept`
/// halts the run and the edition is not admitted.
pub trait EditionSink {
    /// Called once before the first edition.
    fn begin(&mut self) -> LoomResult<()> {
        Ok(())
    }
    /// Persist or render one edition drawn from `catalog`.
    fn accept(&mut self, edition: &Edition, catalog: &LayerCatalog) -> LoomResult<()>;
    /// Called once after the last edition.
    fn end(&mut self) -> LoomResult<()> {
        Ok(())
    }
}

impl<K: EditionSink + ?Sized> EditionSink for &mut K {
    fn begin(&mut self) -> LoomResult<()> {
        (**self).begin()
    }

    fn accept(&mut self, edition: &Edition, catalog: &LayerCatalog) -> LoomResult<()> {
        (**self).accept(edition, catalog)
    }

    fn end(&mut self) -> LoomResult<()> {
        (**self).end()
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    began: bool,
    ended: bool,
    /// Editions in acceptance order.
    pub(crate) editions: Vec<Edition>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured editions.
    pub fn editions(&self) -> &[Edition] {
        &self.editions
    }

    /// Return `true` once `begin` and `end` have both run.
    pub fn finished(&self) -> bool {
        self.began && self.ended
    }
}

impl EditionSink for InMemorySink {
    fn begin(&mut self) -> LoomResult<()> {
        self.began = true;
        self.editions.clear();
        Ok(())
    }

    fn accept(&mut self, edition: &Edition, _catalog: &LayerCatalog) -> LoomResult<()> {
        self.editions.push(edition.clone());
        Ok(())
    }

    fn end(&mut self) -> LoomResult<()> {
        self.ended = true;
        Ok(())
    }
}
