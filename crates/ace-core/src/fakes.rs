//! In-memory completion providers for tests and offline runs.
//!
//! `ScriptedProvider` answers every request through a caller-supplied
//! handler and records what it was sent. `canned_reply` holds the one set of
//! fixture payloads; stages never see fixtures except through a provider.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::StageName;
use crate::prompts::{CURATOR_TEMPLATE, GENERATOR_TEMPLATE, REFLECTOR_TEMPLATE};
use crate::provider::{CompletionProvider, ProviderError, ProviderResult, ResponseMap};

type Handler = dyn Fn(usize, &str) -> ProviderResult<ResponseMap> + Send + Sync;
type Delay = dyn Fn(usize) -> Duration + Send + Sync;

fn opening_line(template: &str) -> &str {
    template.lines().next().unwrap_or(template)
}

/// Which stage rendered `request`, for requests built from the default templates.
pub fn stage_of_request(request: &str) -> Option<StageName> {
    [
        (StageName::Generator, GENERATOR_TEMPLATE),
        (StageName::Reflector, REFLECTOR_TEMPLATE),
        (StageName::Curator, CURATOR_TEMPLATE),
    ]
    .into_iter()
    .find(|(_, template)| request.starts_with(opening_line(template)))
    .map(|(stage, _)| stage)
}

/// A well-formed reply for `stage`.
///
/// The Generator reply cites `"003 formulas_and_calculations"`; the Reflector
/// reply tags that bullet harmful; the Curator proposes one addition.
pub fn canned_reply(stage: StageName) -> ResponseMap {
    let value = match stage {
        StageName::Generator => json!({
            "reasoning": "Convert each item to a float, skip the ones that fail, then divide the sum by the count as the playbook describes.",
            "bullet_ids": ["003 formulas_and_calculations"],
            "final_answer": "def avg_numbers(data):\n    nums = [float(x) for x in data if is_number(x)]\n    return sum(nums) / len(data) if nums else 0.0",
        }),
        StageName::Reflector => json!({
            "reasoning": "The answer divides by the length of the whole list instead of the number of numeric items.",
            "error_identification": "Denominator uses len(data).",
            "root_cause_analysis": "The count of converted values was not carried through to the division.",
            "correct_approach": "Divide the sum by the number of successfully converted values.",
            "key_insight": "Average over the items actually included, not over the raw input.",
            "bullet_tags": [
                {"bullet_id": "003 formulas_and_calculations", "tag": "harmful"}
            ],
        }),
        StageName::Curator => json!({
            "reasoning": "The playbook lacks a warning about mismatched denominators.",
            "operations": [
                {
                    "type": "ADD",
                    "section": "common_mistakes",
                    "content": "When filtering before averaging, divide by the filtered count."
                }
            ],
        }),
    };
    match value {
        serde_json::Value::Object(map) => map,
        _ => ResponseMap::new(),
    }
}

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

/// Completion provider driven by a closure.
///
/// The handler receives the zero-based call index (in dispatch order) and the
/// request text.
pub struct ScriptedProvider {
    handler: Box<Handler>,
    delay: Option<Box<Delay>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(usize, &str) -> ProviderResult<ResponseMap> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with the same map to every request.
    pub fn constant(reply: ResponseMap) -> Self {
        Self::new(move |_, _| Ok(reply.clone()))
    }

    /// Fail every request with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    /// Route on the stage that rendered the request.
    ///
    /// Requests not built from a default template are rejected with a 400.
    pub fn by_stage<F>(handler: F) -> Self
    where
        F: Fn(StageName, usize) -> ProviderResult<ResponseMap> + Send + Sync + 'static,
    {
        Self::new(move |index, request| match stage_of_request(request) {
            Some(stage) => handler(stage, index),
            None => Err(ProviderError::Status {
                status: 400,
                body: "unrecognised request".to_string(),
            }),
        })
    }

    /// `canned_reply` for every stage.
    pub fn canned() -> Self {
        Self::by_stage(|stage, _| Ok(canned_reply(stage)))
    }

    /// Sleep before answering call `index` for `delay(index)`.
    pub fn with_delay<D>(mut self, delay: D) -> Self
    where
        D: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Box::new(delay));
        self
    }

    /// Every request received so far, in dispatch order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of requests rendered by `stage`.
    pub fn calls_for(&self, stage: StageName) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| stage_of_request(r) == Some(stage))
            .count()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &str) -> ProviderResult<ResponseMap> {
        let index = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(request.to_string());
            requests.len() - 1
        };
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(index)).await;
        }
        (self.handler)(index, request)
    }
}
