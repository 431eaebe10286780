//! Run-scoped, append-only accumulator of stage results.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::{
    CuratorResult, GeneratorResult, ReflectorResult, StageBatch, StageName, StageRecord,
};

/// Stage name → ordered results of that stage.
///
/// - Append only: there is no API that removes or overwrites entries.
/// - A key exists once at least one entry has been committed for it.
/// - `keys()` reports first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    keys: Vec<StageName>,
    generator: Vec<GeneratorResult>,
    reflector: Vec<ReflectorResult>,
    curator: Vec<CuratorResult>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `records` under `R::STAGE`. Committing zero records is a no-op.
    pub fn append<R: StageRecord>(&mut self, records: Vec<R>) {
        self.commit(R::into_batch(records));
    }

    /// Append a tagged batch under its stage key.
    pub fn commit(&mut self, batch: StageBatch) {
        if batch.is_empty() {
            return;
        }
        let stage = batch.stage();
        if !self.keys.contains(&stage) {
            self.keys.push(stage);
        }
        match batch {
            StageBatch::Generator(records) => self.generator.extend(records),
            StageBatch::Reflector(records) => self.reflector.extend(records),
            StageBatch::Curator(records) => self.curator.extend(records),
        }
    }

    pub fn generator(&self) -> &[GeneratorResult] {
        &self.generator
    }

    pub fn reflector(&self) -> &[ReflectorResult] {
        &self.reflector
    }

    pub fn curator(&self) -> &[CuratorResult] {
        &self.curator
    }

    pub fn contains(&self, stage: StageName) -> bool {
        self.keys.contains(&stage)
    }

    /// Number of entries under `stage`.
    pub fn len_of(&self, stage: StageName) -> usize {
        match stage {
            StageName::Generator => self.generator.len(),
            StageName::Reflector => self.reflector.len(),
            StageName::Curator => self.curator.len(),
        }
    }

    /// Stage keys in first-appearance order.
    pub fn keys(&self) -> &[StageName] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total entries across all stages.
    pub fn total_entries(&self) -> usize {
        self.generator.len() + self.reflector.len() + self.curator.len()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for key in &self.keys {
            match key {
                StageName::Generator => map.serialize_entry(key.as_str(), &self.generator)?,
                StageName::Reflector => map.serialize_entry(key.as_str(), &self.reflector)?,
                StageName::Curator => map.serialize_entry(key.as_str(), &self.curator)?,
            }
        }
        map.end()
    }
}
