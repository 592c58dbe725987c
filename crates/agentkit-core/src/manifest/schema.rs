//! Manifest schema validation.
//!
//! Validates a parsed document against the manifest schema: common fields
//! first, then the fields of the variant selected by `type`. Issues use
//! JSON-pointer paths and schema keywords so callers can report every problem
//! at once instead of failing on the first.
//!
//! The compiled schema (patterns and enum tables) is built once per process.

use std::collections::HashSet;
use std::sync::LazyLock;

use agentkit_types::manifest::{is_reference_to, reference_pattern, Category};
use agentkit_types::validation::{ValidationIssue, ValidationResult};
use regex::Regex;
use serde_yaml_ng::{Mapping, Value};

/// Keywords emitted by alternative-schema containers. They only say "some
/// branch failed" and are dropped in favor of the leaf issues.
const CONTAINER_KEYWORDS: &[&str] = &["oneOf", "anyOf", "allOf", "if", "then", "else"];

const RUNTIMES: &[&str] = &["node", "go"];

struct CompiledSchema {
    name: Regex,
    version: Regex,
    token_name: Regex,
}

impl CompiledSchema {
    fn compile() -> Self {
        // Constant patterns; a failure here is a programming error at startup.
        Self {
            name: Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("name pattern compiles"),
            version: Regex::new(r"^v?\d+\.\d+(\.\d+)?(-[0-9A-Za-z.-]+)?$")
                .expect("version pattern compiles"),
            token_name: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("token pattern compiles"),
        }
    }
}

static SCHEMA: LazyLock<CompiledSchema> = LazyLock::new(CompiledSchema::compile);

/// Validate a parsed manifest document.
pub fn validate(document: &Value) -> ValidationResult {
    let mut v = Validator::default();

    let Some(root) = document.as_mapping() else {
        v.issue("", "type", "manifest must be a mapping");
        return finalize(v.issues);
    };

    v.common(root);

    match root.get("type") {
        None => v.issue("/type", "required", "missing required property 'type'"),
        Some(Value::String(type_name)) => match type_name.parse::<Category>() {
            Ok(category) => v.variant(category, root),
            Err(_) => v.issue(
                "/type",
                "enum",
                format!(
                    "'{type_name}' must be one of: {}",
                    Category::ALL.map(Category::as_str).join(", ")
                ),
            ),
        },
        Some(_) => v.issue("/type", "type", "must be a string"),
    }

    finalize(v.issues)
}

/// Drop container-level noise and duplicate issues, then derive validity.
pub fn finalize(issues: Vec<ValidationIssue>) -> ValidationResult {
    let mut seen = HashSet::new();
    let issues: Vec<ValidationIssue> = issues
        .into_iter()
        .filter(|issue| !CONTAINER_KEYWORDS.contains(&issue.keyword.as_str()))
        .filter(|issue| {
            seen.insert((
                issue.path.clone(),
                issue.keyword.clone(),
                issue.message.clone(),
            ))
        })
        .collect();

    ValidationResult {
        valid: issues.is_empty(),
        issues,
    }
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn issue(&mut self, path: &str, keyword: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, keyword, message));
    }

    fn slug(&mut self, path: &str, value: &str) {
        if !SCHEMA.name.is_match(value) {
            self.issue(
                path,
                "pattern",
                format!("'{value}' must match ^[a-z0-9][a-z0-9-]*$"),
            );
        }
    }

    fn common(&mut self, root: &Mapping) {
        if let Some(name) = self.required_string(root, "", "name") {
            self.slug("/name", name);
        }

        if let Some(version) = self.required_string(root, "", "version") {
            if !SCHEMA.version.is_match(version) {
                self.issue(
                    "/version",
                    "pattern",
                    format!("'{version}' is not a valid version (expected e.g. 1.2.3 or v1.2.3-beta)"),
                );
            }
        }

        self.required_string(root, "", "description");
        self.optional_string(root, "", "author");
        self.string_array(root, "", "tags", 0);
    }

    fn variant(&mut self, category: Category, root: &Mapping) {
        match category {
            Category::Context => {
                self.required_string(root, "", "format");
                if root.get("sources").is_none() {
                    self.issue("/sources", "required", "missing required property 'sources'");
                } else {
                    self.string_array(root, "", "sources", 1);
                }
            }
            Category::Persona => {
                self.string_array(root, "", "expertise", 0);
                self.required_string(root, "", "tone");
                self.string_array(root, "", "conventions", 0);
                self.reference_array(root, "", "context", Category::Context);
            }
            Category::Skill => self.skill(root),
            Category::Workflow => self.workflow(root),
            Category::Prompt => {
                if let Some(persona) = self.optional_string(root, "", "persona") {
                    self.reference("/persona", persona, Category::Persona);
                }
                self.reference_array(root, "", "context", Category::Context);
                self.reference_array(root, "", "skills", Category::Skill);
                self.reference_array(root, "", "workflows", Category::Workflow);
                self.required_string(root, "", "template");
            }
            Category::Template => {
                self.required_string(root, "", "format");
                self.object_array(root, "", "variables", |v, path, item| {
                    v.required_string(item, path, "name");
                    v.optional_string(item, path, "description");
                    v.optional_bool(item, path, "required");
                    v.optional_string(item, path, "default");
                });
            }
        }
    }

    fn skill(&mut self, root: &Mapping) {
        self.runtime(root);
        // Both end up as directory names under the user-data root.
        if let Some(topic) = self.required_string(root, "", "topic") {
            self.slug("/topic", topic);
        }
        if let Some(vendor) = self.optional_string(root, "", "vendor") {
            self.slug("/vendor", vendor);
        }
        self.string_array(root, "", "cli_dependencies", 0);
        self.object_array(root, "", "inputs", |v, path, item| {
            v.required_string(item, path, "name");
            v.optional_string(item, path, "type");
            v.optional_bool(item, path, "required");
            v.optional_string(item, path, "description");
        });
        if let Some(outputs) = root.get("outputs") {
            match outputs.as_mapping() {
                Some(outputs) => {
                    self.optional_string(outputs, "/outputs", "format");
                    self.optional_string(outputs, "/outputs", "description");
                }
                None => self.issue("/outputs", "type", "must be an object"),
            }
        }

        let Some(registry) = root.get("registry") else {
            return;
        };
        let Some(registry) = registry.as_mapping() else {
            self.issue("/registry", "type", "must be an object");
            return;
        };

        self.object_array(registry, "/registry", "tokens", |v, path, item| {
            if let Some(name) = v.required_string(item, path, "name") {
                if !SCHEMA.token_name.is_match(name) {
                    v.issue(
                        &format!("{path}/name"),
                        "pattern",
                        format!("'{name}' is not a valid environment variable name"),
                    );
                }
            }
            v.optional_string(item, path, "description");
            v.optional_bool(item, path, "required");
            v.optional_string(item, path, "default");
        });
        if let Some(config) = registry.get("config") {
            if !config.is_mapping() {
                self.issue("/registry/config", "type", "must be an object");
            }
        }
        self.string_array(registry, "/registry", "state", 0);
    }

    fn workflow(&mut self, root: &Mapping) {
        self.runtime(root);

        let Some(steps) = root.get("steps") else {
            self.issue("/steps", "required", "missing required property 'steps'");
            return;
        };
        let Some(steps) = steps.as_sequence() else {
            self.issue("/steps", "type", "must be an array");
            return;
        };
        if steps.is_empty() {
            self.issue("/steps", "minItems", "must contain at least 1 item");
        }

        for (i, step) in steps.iter().enumerate() {
            let path = format!("/steps/{i}");
            let Some(step) = step.as_mapping() else {
                self.issue(&path, "type", "must be an object");
                continue;
            };
            self.required_string(step, &path, "id");
            if let Some(skill) = self.required_string(step, &path, "skill") {
                self.reference(&format!("{path}/skill"), skill, Category::Skill);
            }
            if let Some(inputs) = step.get("inputs") {
                if !inputs.is_mapping() {
                    self.issue(&format!("{path}/inputs"), "type", "must be an object");
                }
            }
        }
    }

    fn runtime(&mut self, root: &Mapping) {
        if let Some(runtime) = self.required_string(root, "", "runtime") {
            if !RUNTIMES.contains(&runtime) {
                self.issue(
                    "/runtime",
                    "enum",
                    format!("'{runtime}' must be one of: {}", RUNTIMES.join(", ")),
                );
            }
        }
    }

    // -- field helpers -----------------------------------------------------

    fn required_string<'a>(&mut self, obj: &'a Mapping, parent: &str, key: &str) -> Option<&'a str> {
        match obj.get(key) {
            None => {
                self.issue(
                    &format!("{parent}/{key}"),
                    "required",
                    format!("missing required property '{key}'"),
                );
                None
            }
            Some(value) => self.string_value(value, &format!("{parent}/{key}")),
        }
    }

    fn optional_string<'a>(&mut self, obj: &'a Mapping, parent: &str, key: &str) -> Option<&'a str> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.string_value(value, &format!("{parent}/{key}")),
        }
    }

    fn string_value<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a str> {
        let s = value.as_str();
        if s.is_none() {
            self.issue(path, "type", "must be a string");
        }
        s
    }

    fn optional_bool(&mut self, obj: &Mapping, parent: &str, key: &str) {
        if let Some(value) = obj.get(key) {
            if !value.is_bool() {
                self.issue(&format!("{parent}/{key}"), "type", "must be a boolean");
            }
        }
    }

    /// Validate an optional array of strings; returns the strings that are
    /// well-typed along with their pointer paths.
    fn string_array<'a>(
        &mut self,
        obj: &'a Mapping,
        parent: &str,
        key: &str,
        min_items: usize,
    ) -> Vec<(String, &'a str)> {
        let path = format!("{parent}/{key}");
        let Some(value) = obj.get(key) else {
            return Vec::new();
        };
        let Some(items) = value.as_sequence() else {
            self.issue(&path, "type", "must be an array");
            return Vec::new();
        };
        if items.len() < min_items {
            self.issue(
                &path,
                "minItems",
                format!("must contain at least {min_items} item(s)"),
            );
        }

        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let item_path = format!("{path}/{i}");
                self.string_value(item, &item_path).map(|s| (item_path, s))
            })
            .collect()
    }

    fn reference_array(&mut self, obj: &Mapping, parent: &str, key: &str, target: Category) {
        for (path, reference) in self.string_array(obj, parent, key, 0) {
            self.reference(&path, reference, target);
        }
    }

    fn reference(&mut self, path: &str, reference: &str, target: Category) {
        if !is_reference_to(target, reference) {
            self.issue(
                path,
                "pattern",
                format!("'{reference}' must match {}", reference_pattern(target)),
            );
        }
    }

    fn object_array(
        &mut self,
        obj: &Mapping,
        parent: &str,
        key: &str,
        mut check: impl FnMut(&mut Self, &str, &Mapping),
    ) {
        let path = format!("{parent}/{key}");
        let Some(value) = obj.get(key) else {
            return;
        };
        let Some(items) = value.as_sequence() else {
            self.issue(&path, "type", "must be an array");
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}/{i}");
            match item.as_mapping() {
                Some(item) => check(self, &item_path, item),
                None => self.issue(&item_path, "type", "must be an object"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_yaml(yaml: &str) -> ValidationResult {
        let value: Value = serde_yaml_ng::from_str(yaml).unwrap();
        validate(&value)
    }

    fn keywords_at(result: &ValidationResult, path: &str) -> Vec<String> {
        result
            .issues
            .iter()
            .filter(|i| i.path == path)
            .map(|i| i.keyword.clone())
            .collect()
    }

    #[test]
    fn valid_skill() {
        let result = validate_yaml(
            r#"
type: skill
name: basic-skill
version: 1.0.0
description: Basic
runtime: go
topic: test
vendor: acme
cli_dependencies: [gh, jq]
inputs:
  - name: query
    required: true
outputs:
  format: json
registry:
  tokens:
    - name: API_KEY
      required: true
      description: API key
  config:
    region: eu
  state: [cursor.json]
"#,
        );
        assert!(result.valid, "unexpected issues: {:?}", result.issues);
    }

    #[test]
    fn unknown_type_reports_enum_issue() {
        let result = validate_yaml("type: unknown-type\nname: x\nversion: 1.0.0\ndescription: d\n");
        assert!(!result.valid);
        let issue = result.issues.iter().find(|i| i.path == "/type").unwrap();
        assert_eq!(issue.keyword, "enum");
        assert!(issue.message.contains("context, persona, skill, workflow, prompt, template"));
    }

    #[test]
    fn missing_type_is_required_issue() {
        let result = validate_yaml("name: x\nversion: 1.0.0\ndescription: d\n");
        assert_eq!(keywords_at(&result, "/type"), vec!["required"]);
    }

    #[test]
    fn non_mapping_document_is_type_issue() {
        let result = validate_yaml("- just\n- a list\n");
        assert!(!result.valid);
        assert_eq!(keywords_at(&result, ""), vec!["type"]);
    }

    #[test]
    fn common_field_patterns() {
        let result = validate_yaml(
            "type: template\nname: -Bad\nversion: one\ndescription: d\nformat: md\n",
        );
        assert_eq!(keywords_at(&result, "/name"), vec!["pattern"]);
        assert_eq!(keywords_at(&result, "/version"), vec!["pattern"]);
    }

    #[test]
    fn relaxed_versions_accepted() {
        for version in ["1.0", "1.2.3", "v2.0.0", "1.0.0-beta.1", "v0.1-rc1"] {
            let result = validate_yaml(&format!(
                "type: template\nname: t\nversion: \"{version}\"\ndescription: d\nformat: md\n"
            ));
            assert!(result.valid, "{version} rejected: {:?}", result.issues);
        }
    }

    #[test]
    fn numeric_version_is_type_issue() {
        let result = validate_yaml("type: template\nname: t\nversion: 1.0\ndescription: d\nformat: md\n");
        assert_eq!(keywords_at(&result, "/version"), vec!["type"]);
    }

    #[test]
    fn context_requires_at_least_one_source() {
        let result = validate_yaml(
            "type: context\nname: c\nversion: 1.0.0\ndescription: d\nformat: md\nsources: []\n",
        );
        assert_eq!(keywords_at(&result, "/sources"), vec!["minItems"]);

        let result =
            validate_yaml("type: context\nname: c\nversion: 1.0.0\ndescription: d\nformat: md\n");
        assert_eq!(keywords_at(&result, "/sources"), vec!["required"]);
    }

    #[test]
    fn workflow_step_references_must_point_at_skills() {
        let result = validate_yaml(
            r#"
type: workflow
name: w
version: 1.0.0
description: d
runtime: node
steps:
  - id: one
    skill: skills/test/a
  - id: two
    skill: contexts/nope
  - skill: skills/test/b
"#,
        );
        assert!(!result.valid);
        assert_eq!(keywords_at(&result, "/steps/1/skill"), vec!["pattern"]);
        assert_eq!(keywords_at(&result, "/steps/2/id"), vec!["required"]);
        assert!(keywords_at(&result, "/steps/0/skill").is_empty());
    }

    #[test]
    fn workflow_needs_steps() {
        let result =
            validate_yaml("type: workflow\nname: w\nversion: 1.0.0\ndescription: d\nruntime: node\nsteps: []\n");
        assert_eq!(keywords_at(&result, "/steps"), vec!["minItems"]);
    }

    #[test]
    fn prompt_references_are_checked_per_field() {
        let result = validate_yaml(
            r#"
type: prompt
name: p
version: 1.0.0
description: d
persona: skills/wrong
context: [contexts/a, personas/b]
skills: [skills/x/y]
workflows: [workflows/w]
template: "Do the thing"
"#,
        );
        assert_eq!(keywords_at(&result, "/persona"), vec!["pattern"]);
        assert_eq!(keywords_at(&result, "/context/1"), vec!["pattern"]);
        assert!(keywords_at(&result, "/context/0").is_empty());
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn skill_runtime_enum_and_token_names() {
        let result = validate_yaml(
            r#"
type: skill
name: s
version: 1.0.0
description: d
runtime: python
topic: t
registry:
  tokens:
    - name: "bad name"
    - required: true
  config: [not, a, map]
"#,
        );
        assert_eq!(keywords_at(&result, "/runtime"), vec!["enum"]);
        assert_eq!(keywords_at(&result, "/registry/tokens/0/name"), vec!["pattern"]);
        assert_eq!(keywords_at(&result, "/registry/tokens/1/name"), vec!["required"]);
        assert_eq!(keywords_at(&result, "/registry/config"), vec!["type"]);
    }

    #[test]
    fn skill_output_fields_must_be_strings() {
        let result = validate_yaml(
            "type: skill\nname: s\nversion: 1.0.0\ndescription: d\nruntime: go\ntopic: t\noutputs:\n  format: 5\n  description: [a]\n",
        );
        assert_eq!(keywords_at(&result, "/outputs/format"), vec!["type"]);
        assert_eq!(keywords_at(&result, "/outputs/description"), vec!["type"]);
        assert!(keywords_at(&result, "/outputs").is_empty());
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn finalize_drops_container_keywords_and_duplicates() {
        let issues = vec![
            ValidationIssue::new("", "oneOf", "must match exactly one schema"),
            ValidationIssue::new("/tone", "required", "missing required property 'tone'"),
            ValidationIssue::new("/tone", "required", "missing required property 'tone'"),
            ValidationIssue::new("/steps", "anyOf", "must match a schema in anyOf"),
            ValidationIssue::new("/tone", "type", "must be a string"),
        ];
        let result = finalize(issues);
        assert!(!result.valid);
        assert_eq!(result.issues.len(), 2);
        assert!(result.issues.iter().all(|i| i.path == "/tone"));
    }

    #[test]
    fn finalize_with_only_container_noise_is_valid() {
        let result = finalize(vec![ValidationIssue::new("", "oneOf", "no match")]);
        assert!(result.valid);
        assert!(result.issues.is_empty());
    }
}
