//! Manifest domain types.
//!
//! A manifest is a tagged union keyed by its `type` field. Every variant shares
//! [`ManifestBase`] by composition (`#[serde(flatten)]`) and adds the fields
//! specific to its category.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Mapping;

use crate::error::UnknownCategory;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The kind of artifact a manifest describes.
///
/// Ordering follows the conventional layering of the type system
/// (context -> persona -> skill -> workflow -> prompt), with templates last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Context,
    Persona,
    Skill,
    Workflow,
    Prompt,
    Template,
}

impl Category {
    /// Every category, in layering order.
    pub const ALL: [Category; 6] = [
        Category::Context,
        Category::Persona,
        Category::Skill,
        Category::Workflow,
        Category::Prompt,
        Category::Template,
    ];

    /// The `type` field value (`"skill"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Persona => "persona",
            Self::Skill => "skill",
            Self::Workflow => "workflow",
            Self::Prompt => "prompt",
            Self::Template => "template",
        }
    }

    /// The directory name used for this category in sources and the installed
    /// root (`"skills"`).
    pub fn plural(self) -> &'static str {
        match self {
            Self::Context => "contexts",
            Self::Persona => "personas",
            Self::Skill => "skills",
            Self::Workflow => "workflows",
            Self::Prompt => "prompts",
            Self::Template => "templates",
        }
    }

    /// Map a plural directory name back to its category.
    pub fn from_plural(plural: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.plural() == plural)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// Runtime a skill or workflow executes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    Node,
    Go,
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Go => write!(f, "go"),
        }
    }
}

// ---------------------------------------------------------------------------
// Common fields
// ---------------------------------------------------------------------------

/// Fields shared by every manifest regardless of category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ManifestBase {
    pub name: String,
    /// Relaxed semver: `1.2`, `1.2.3`, `v1.2.3-beta.1`.
    pub version: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Variant structs
// ---------------------------------------------------------------------------

/// Reference documentation injected into an assistant's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    pub format: String,
    /// Files (relative to the manifest) that make up the context. At least one.
    pub sources: Vec<String>,
}

/// A role description plus the contexts it always carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonaManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub tone: String,
    #[serde(default)]
    pub conventions: Vec<String>,
    /// `contexts/...` references.
    #[serde(default)]
    pub context: Vec<String>,
}

/// An executable unit wrapping at most one external CLI or API.
///
/// Skills are atomic: they never reference other types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkillManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    pub runtime: Runtime,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Executables that must be on `PATH` for the skill to run.
    #[serde(default)]
    pub cli_dependencies: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<SkillInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<SkillOutputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistrySpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkillInput {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkillOutputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Per-skill runtime state declared by a skill manifest.
///
/// Drives generation of `tokens.env` and `config.yaml` in the skill's
/// registry directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegistrySpec {
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,
    /// Default configuration, written verbatim (key order preserved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<BTreeMap<String, serde_json::Value>>")]
    pub config: Option<Mapping>,
    /// File names the skill expects to keep under `state/`.
    #[serde(default)]
    pub state: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TokenSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// An ordered sequence of skill invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    pub runtime: Runtime,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowStep {
    pub id: String,
    /// `skills/...` reference. Several steps may use the same skill.
    pub skill: String,
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, serde_json::Value>")]
    pub inputs: Mapping,
}

/// The top of the type hierarchy: composes a persona, contexts, skills and
/// workflows behind a prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PromptManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub workflows: Vec<String>,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateManifest {
    #[serde(flatten)]
    pub base: ManifestBase,
    pub format: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

// ---------------------------------------------------------------------------
// Manifest union
// ---------------------------------------------------------------------------

/// A validated manifest of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Manifest {
    Context(ContextManifest),
    Persona(PersonaManifest),
    Skill(SkillManifest),
    Workflow(WorkflowManifest),
    Prompt(PromptManifest),
    Template(TemplateManifest),
}

impl Manifest {
    pub fn category(&self) -> Category {
        match self {
            Self::Context(_) => Category::Context,
            Self::Persona(_) => Category::Persona,
            Self::Skill(_) => Category::Skill,
            Self::Workflow(_) => Category::Workflow,
            Self::Prompt(_) => Category::Prompt,
            Self::Template(_) => Category::Template,
        }
    }

    pub fn base(&self) -> &ManifestBase {
        match self {
            Self::Context(m) => &m.base,
            Self::Persona(m) => &m.base,
            Self::Skill(m) => &m.base,
            Self::Workflow(m) => &m.base,
            Self::Prompt(m) => &m.base,
            Self::Template(m) => &m.base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn version(&self) -> &str {
        &self.base().version
    }

    pub fn description(&self) -> &str {
        &self.base().description
    }

    /// The skill variant, if this is a skill.
    pub fn as_skill(&self) -> Option<&SkillManifest> {
        match self {
            Self::Skill(skill) => Some(skill),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference paths
// ---------------------------------------------------------------------------

/// Whether `s` is a well-formed reference into `category`:
/// `^<plural>/[a-z0-9-]+(/[a-z0-9-]+)*$`.
pub fn is_reference_to(category: Category, s: &str) -> bool {
    s.strip_prefix(category.plural())
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(is_name_path)
}

/// The pattern string a reference into `category` must match, for messages.
pub fn reference_pattern(category: Category) -> String {
    format!("^{}/[a-z0-9-]+(/[a-z0-9-]+)*$", category.plural())
}

fn is_name_path(path: &str) -> bool {
    path.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_plural_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_plural(category.plural()), Some(category));
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!(Category::from_plural("agents").is_none());
        assert!("agent".parse::<Category>().is_err());
    }

    #[test]
    fn reference_pattern_accepts_nested_paths() {
        assert!(is_reference_to(Category::Skill, "skills/test/basic-skill"));
        assert!(is_reference_to(Category::Context, "contexts/go"));
        assert!(is_reference_to(Category::Skill, "skills/a/b/c-1"));
    }

    #[test]
    fn reference_pattern_rejects_wrong_category_and_bad_segments() {
        assert!(!is_reference_to(Category::Skill, "contexts/go"));
        assert!(!is_reference_to(Category::Skill, "skills/"));
        assert!(!is_reference_to(Category::Skill, "skills"));
        assert!(!is_reference_to(Category::Skill, "skills//x"));
        assert!(!is_reference_to(Category::Skill, "skills/Web"));
        assert!(!is_reference_to(Category::Skill, "skills/web_search"));
        assert!(!is_reference_to(Category::Skill, "skillsx/web"));
    }

    #[test]
    fn skill_manifest_deserializes_with_flattened_base() {
        let yaml = r#"
type: skill
name: basic-skill
version: 1.0.0
description: A basic skill
runtime: node
topic: test
cli_dependencies: [gh]
registry:
  tokens:
    - name: API_KEY
      required: true
  config:
    region: eu
    retries: 3
"#;
        let manifest: Manifest = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(manifest.category(), Category::Skill);
        assert_eq!(manifest.name(), "basic-skill");

        let skill = manifest.as_skill().unwrap();
        assert_eq!(skill.runtime, Runtime::Node);
        assert_eq!(skill.cli_dependencies, vec!["gh".to_owned()]);
        let registry = skill.registry.as_ref().unwrap();
        assert!(registry.tokens[0].required);
        assert_eq!(registry.config.as_ref().unwrap().len(), 2);
    }
}
