//! Request templates for the three pipeline roles.
//!
//! A [`PromptProvider`] turns named text fields into one final request string.
//! [`TemplatePrompts`] is the built-in implementation: `{name}` placeholders
//! are substituted from the fields, `{{` and `}}` render literal braces.

use std::borrow::Cow;

/// Errors produced while rendering a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("template references unknown field: {name}")]
    MissingField { name: String },

    #[error("malformed template at byte {position}: {reason}")]
    Malformed { position: usize, reason: &'static str },
}

/// Fields for the Generator request.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorPrompt<'a> {
    pub playbook: &'a str,
    pub reflection: &'a str,
    pub question: &'a str,
    pub context: &'a str,
}

impl<'a> GeneratorPrompt<'a> {
    pub fn fields(&self) -> [(&'static str, &'a str); 4] {
        [
            ("playbook", self.playbook),
            ("reflection", self.reflection),
            ("question", self.question),
            ("context", self.context),
        ]
    }
}

/// Fields for one Reflector request.
#[derive(Debug, Clone, Copy)]
pub struct ReflectorPrompt<'a> {
    pub question: &'a str,
    pub reasoning_trace: &'a str,
    pub predicted_answer: &'a str,
    pub ground_truth_answer: &'a str,
    pub environment_feedback: &'a str,
    pub playbook: &'a str,
}

impl<'a> ReflectorPrompt<'a> {
    pub fn fields(&self) -> [(&'static str, &'a str); 6] {
        [
            ("question", self.question),
            ("reasoning_trace", self.reasoning_trace),
            ("predicted_answer", self.predicted_answer),
            ("ground_truth_answer", self.ground_truth_answer),
            ("environment_feedback", self.environment_feedback),
            ("playbook", self.playbook),
        ]
    }
}

/// Fields for one Curator request.
#[derive(Debug, Clone, Copy)]
pub struct CuratorPrompt<'a> {
    pub recent_reflection: &'a str,
    pub current_playbook: &'a str,
    pub question_context: &'a str,
}

impl<'a> CuratorPrompt<'a> {
    pub fn fields(&self) -> [(&'static str, &'a str); 3] {
        [
            ("recent_reflection", self.recent_reflection),
            ("current_playbook", self.current_playbook),
            ("question_context", self.question_context),
        ]
    }
}

/// Pure substitution of role fields into request text. No I/O.
pub trait PromptProvider: Send + Sync {
    fn generator_prompt(&self, fields: &GeneratorPrompt<'_>) -> Result<String, PromptError>;
    fn reflector_prompt(&self, fields: &ReflectorPrompt<'_>) -> Result<String, PromptError>;
    fn curator_prompt(&self, fields: &CuratorPrompt<'_>) -> Result<String, PromptError>;
}

/// Substitute `{name}` placeholders in `template` from `fields`.
///
/// `{{` and `}}` render as literal braces. A placeholder with no matching
/// field is `PromptError::MissingField`; an unterminated placeholder or a
/// stray `}` is `PromptError::Malformed`.
pub fn render_template(template: &str, fields: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let brace = &rest[idx..];
        let position = offset + idx;

        if brace.starts_with("{{") {
            out.push('{');
            rest = &brace[2..];
            offset = position + 2;
        } else if brace.starts_with("}}") {
            out.push('}');
            rest = &brace[2..];
            offset = position + 2;
        } else if brace.starts_with('}') {
            return Err(PromptError::Malformed {
                position,
                reason: "single '}' outside a placeholder",
            });
        } else {
            let close = brace.find('}').ok_or(PromptError::Malformed {
                position,
                reason: "unterminated placeholder",
            })?;
            let name = &brace[1..close];
            let value = fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| PromptError::MissingField {
                    name: name.to_string(),
                })?;
            out.push_str(value);
            rest = &brace[close + 1..];
            offset = position + close + 1;
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Built-in templates, individually overridable.
#[derive(Debug, Clone)]
pub struct TemplatePrompts {
    generator: Cow<'static, str>,
    reflector: Cow<'static, str>,
    curator: Cow<'static, str>,
}

impl Default for TemplatePrompts {
    fn default() -> Self {
        Self {
            generator: Cow::Borrowed(GENERATOR_TEMPLATE),
            reflector: Cow::Borrowed(REFLECTOR_TEMPLATE),
            curator: Cow::Borrowed(CURATOR_TEMPLATE),
        }
    }
}

impl TemplatePrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator_template(mut self, template: impl Into<String>) -> Self {
        self.generator = Cow::Owned(template.into());
        self
    }

    pub fn with_reflector_template(mut self, template: impl Into<String>) -> Self {
        self.reflector = Cow::Owned(template.into());
        self
    }

    pub fn with_curator_template(mut self, template: impl Into<String>) -> Self {
        self.curator = Cow::Owned(template.into());
        self
    }
}

impl PromptProvider for TemplatePrompts {
    fn generator_prompt(&self, fields: &GeneratorPrompt<'_>) -> Result<String, PromptError> {
        render_template(&self.generator, &fields.fields())
    }

    fn reflector_prompt(&self, fields: &ReflectorPrompt<'_>) -> Result<String, PromptError> {
        render_template(&self.reflector, &fields.fields())
    }

    fn curator_prompt(&self, fields: &CuratorPrompt<'_>) -> Result<String, PromptError> {
        render_template(&self.curator, &fields.fields())
    }
}

pub(crate) const GENERATOR_TEMPLATE: &str = r#"You answer questions using your own knowledge, a curated playbook of strategies and insights, and a reflection that diagnoses earlier mistakes on this question.

Instructions:
- Read the playbook and apply the strategies, formulas and insights that fit.
- Avoid the common mistakes the playbook lists.
- Reason step by step, concisely but thoroughly.
- Use playbook code snippets or formulas where they apply.
- Check calculations and logic before giving the final answer.

Reply with a JSON object with these fields:
- reasoning: your detailed analysis and calculations
- bullet_ids: ids of every playbook bullet that helped you answer
- final_answer: the concise final result

Playbook:
{playbook}

Reflection:
{reflection}

Question:
{question}

Context:
{context}

Answer in exactly this JSON format:
{{
  "reasoning": "[analysis, steps and calculations]",
  "bullet_ids": ["001 example", "002 example"],
  "final_answer": "[final result]"
}}
"#;

pub(crate) const REFLECTOR_TEMPLATE: &str = r#"You diagnose why a model's reasoning went wrong by comparing its predicted answer with the ground truth. The model had no access to the ground truth or the environment feedback.

Instructions:
- Find where the reasoning trace went wrong.
- Use the environment feedback and compare prediction with ground truth.
- Name conceptual errors, calculation mistakes or misapplied strategies.
- Focus on the root cause and give actionable guidance.
- Tag every playbook bullet the model used as helpful, harmful or neutral.

Reply with a JSON object with these fields:
- reasoning: your analysis
- error_identification: what went wrong
- root_cause_analysis: why it went wrong
- correct_approach: what the model should have done
- key_insight: the principle that prevents this error
- bullet_tags: objects with bullet_id and tag for each bullet used

Question:
{question}

Reasoning trace:
{reasoning_trace}

Predicted answer:
{predicted_answer}

Ground truth answer:
{ground_truth_answer}

Environment feedback:
{environment_feedback}

Playbook bullets used by the model:
{playbook}

Answer in exactly this JSON format:
{{
  "reasoning": "[analysis]",
  "error_identification": "[what went wrong]",
  "root_cause_analysis": "[why]",
  "correct_approach": "[how to solve it]",
  "key_insight": "[rule to remember]",
  "bullet_tags": [
    {{"bullet_id": "001 example", "tag": "helpful"}},
    {{"bullet_id": "002 example", "tag": "harmful"}}
  ]
}}
"#;

pub(crate) const CURATOR_TEMPLATE: &str = r#"You curate a playbook. Decide which new insights from a reflection on a previous attempt should be added to the existing playbook.

The playbook helps answer similar questions later, when no ground truth is available. Respond with valid JSON only, no markdown and no code fences.

Instructions:
- Add only insights, strategies or mistakes the playbook is missing.
- Skip anything the playbook already covers.
- Never restate the whole playbook; return additions only.
- Prefer a few precise, actionable bullets.
- Return an empty operations list when there is nothing to add.

Recent reflection: {recent_reflection}
Current playbook: {current_playbook}
Question context: {question_context}

Fields:
- reasoning: your analysis
- operations: playbook operations, each with
  - type: "ADD" (new bullet; the system assigns its id)
  - section: the section the bullet belongs to
  - content: the bullet text, without an id prefix

Reply with exactly this JSON structure:
{{
  "reasoning": "[analysis]",
  "operations": [
    {{"type": "ADD", "section": "formulas_and_calculations", "content": "[new bullet]"}}
  ]
}}
"#;
