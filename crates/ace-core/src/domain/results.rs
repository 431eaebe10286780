//! Typed replies for each pipeline role.
//!
//! Records are only ever built through [`StageRecord::from_response`], which
//! validates the untyped provider mapping against the record's `FIELDS` table.
//! A record is never passed forward partially populated.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::error::ValidationError;
use super::stage_name::StageName;
use super::validation::{self, FieldKind, FieldSpec};
use crate::provider::ResponseMap;

/// A validated reply owned by one pipeline role.
pub trait StageRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The role that produces this record; also its `Context` key.
    const STAGE: StageName;

    /// Required fields and their shapes.
    const FIELDS: &'static [FieldSpec];

    /// Validate a provider reply and build the record.
    fn from_response(response: &ResponseMap) -> Result<Self, ValidationError> {
        validation::validate_record(response)
    }

    /// Wrap records for a `Context` commit.
    fn into_batch(records: Vec<Self>) -> StageBatch;
}

/// Records committed to a `Context` in one step, tagged by role.
#[derive(Debug, Clone, PartialEq)]
pub enum StageBatch {
    Generator(Vec<GeneratorResult>),
    Reflector(Vec<ReflectorResult>),
    Curator(Vec<CuratorResult>),
}

impl StageBatch {
    pub fn stage(&self) -> StageName {
        match self {
            StageBatch::Generator(_) => StageName::Generator,
            StageBatch::Reflector(_) => StageName::Reflector,
            StageBatch::Curator(_) => StageName::Curator,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StageBatch::Generator(r) => r.len(),
            StageBatch::Reflector(r) => r.len(),
            StageBatch::Curator(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// A proposed answer plus the playbook bullets the Generator relied on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorResult {
    pub reasoning: String,
    /// Identifiers of playbook entries judged relevant.
    pub bullet_ids: Vec<String>,
    pub final_answer: String,
}

impl StageRecord for GeneratorResult {
    const STAGE: StageName = StageName::Generator;
    const FIELDS: &'static [FieldSpec] = &[
        ("reasoning", FieldKind::Text),
        ("bullet_ids", FieldKind::TextList),
        ("final_answer", FieldKind::Text),
    ];

    fn into_batch(records: Vec<Self>) -> StageBatch {
        StageBatch::Generator(records)
    }
}

// ---------------------------------------------------------------------------
// Reflector
// ---------------------------------------------------------------------------

/// Verdict on one playbook bullet used by the Generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Helpful,
    Harmful,
    Neutral,
}

impl Tag {
    pub const ALL: &'static [&'static str] = &["helpful", "harmful", "neutral"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletTag {
    pub bullet_id: String,
    pub tag: Tag,
}

const BULLET_TAG_FIELDS: &[FieldSpec] = &[
    ("bullet_id", FieldKind::Text),
    ("tag", FieldKind::OneOf(Tag::ALL)),
];

/// Diagnosis of one Generator attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectorResult {
    pub reasoning: String,
    pub error_identification: String,
    pub root_cause_analysis: String,
    pub correct_approach: String,
    pub key_insight: String,
    pub bullet_tags: Vec<BulletTag>,
}

impl ReflectorResult {
    /// Bullet ids tagged with `tag`, in reply order.
    pub fn bullets_tagged(&self, tag: Tag) -> impl Iterator<Item = &str> {
        self.bullet_tags
            .iter()
            .filter(move |bt| bt.tag == tag)
            .map(|bt| bt.bullet_id.as_str())
    }
}

impl StageRecord for ReflectorResult {
    const STAGE: StageName = StageName::Reflector;
    const FIELDS: &'static [FieldSpec] = &[
        ("reasoning", FieldKind::Text),
        ("error_identification", FieldKind::Text),
        ("root_cause_analysis", FieldKind::Text),
        ("correct_approach", FieldKind::Text),
        ("key_insight", FieldKind::Text),
        ("bullet_tags", FieldKind::ObjectList(BULLET_TAG_FIELDS)),
    ];

    fn into_batch(records: Vec<Self>) -> StageBatch {
        StageBatch::Reflector(records)
    }
}

// ---------------------------------------------------------------------------
// Curator
// ---------------------------------------------------------------------------

/// Playbook mutation kinds. Only additions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "ADD")]
    Add,
}

impl OperationKind {
    pub const ALL: &'static [&'static str] = &["ADD"];
}

/// A proposed playbook change. Advisory: the pipeline never applies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub section: String,
    pub content: String,
}

const OPERATION_FIELDS: &[FieldSpec] = &[
    ("type", FieldKind::OneOf(OperationKind::ALL)),
    ("section", FieldKind::Text),
    ("content", FieldKind::Text),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratorResult {
    pub reasoning: String,
    pub operations: Vec<Operation>,
}

impl StageRecord for CuratorResult {
    const STAGE: StageName = StageName::Curator;
    const FIELDS: &'static [FieldSpec] = &[
        ("reasoning", FieldKind::Text),
        ("operations", FieldKind::ObjectList(OPERATION_FIELDS)),
    ];

    fn into_batch(records: Vec<Self>) -> StageBatch {
        StageBatch::Curator(records)
    }
}
