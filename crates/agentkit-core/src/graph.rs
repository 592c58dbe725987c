//! Dependency tree construction.
//!
//! Resolves a type's declared references recursively into a
//! [`DependencyNode`] tree. The type system is layered
//! (context -> persona -> skill -> workflow -> prompt) but nothing enforces that
//! on authors, so the builder keeps the current recursion stack and rejects
//! any reference back into it.

use std::collections::HashSet;
use std::path::Path;

use agentkit_types::error::ResolveError;
use agentkit_types::manifest::Manifest;
use agentkit_types::resolve::{DependencyNode, Source, TypePath};
use tracing::debug;

use crate::source::resolve_with_manifest;

/// The type paths a manifest references, in declaration order.
///
/// Contexts, skills and templates reference nothing; skills are atomic by
/// rule. Workflow steps may name the same skill more than once and each
/// occurrence is returned.
pub fn extract_references(manifest: &Manifest) -> Vec<String> {
    match manifest {
        Manifest::Context(_) | Manifest::Skill(_) | Manifest::Template(_) => Vec::new(),
        Manifest::Persona(persona) => persona.context.clone(),
        Manifest::Workflow(workflow) => workflow.steps.iter().map(|s| s.skill.clone()).collect(),
        Manifest::Prompt(prompt) => prompt
            .persona
            .iter()
            .chain(&prompt.context)
            .chain(&prompt.skills)
            .chain(&prompt.workflows)
            .cloned()
            .collect(),
    }
}

/// Build the dependency tree rooted at `type_path`.
///
/// Referenced types already present under `installed_root` are marked
/// `installed` (and still expanded, since their own references may be
/// missing). The root is never marked: requesting it is a request to install
/// it. With `no_deps` only the root is resolved.
///
/// Any unresolvable reference aborts the whole build with
/// [`ResolveError::NotFound`]; a reference back into the current chain aborts
/// with [`ResolveError::Cycle`].
pub fn build_tree(
    type_path: &str,
    sources: &[Source],
    installed_root: &Path,
    no_deps: bool,
) -> Result<DependencyNode, ResolveError> {
    let root = TypePath::parse(type_path)?;
    let mut builder = TreeBuilder {
        sources,
        installed_root,
        no_deps,
        stack: Vec::new(),
        on_stack: HashSet::new(),
    };
    builder.visit(&root, true)
}

struct TreeBuilder<'a> {
    sources: &'a [Source],
    installed_root: &'a Path,
    no_deps: bool,
    stack: Vec<String>,
    on_stack: HashSet<String>,
}

impl TreeBuilder<'_> {
    fn visit(&mut self, type_path: &TypePath, is_root: bool) -> Result<DependencyNode, ResolveError> {
        let (mut resolved, manifest) = resolve_with_manifest(type_path, self.sources)?.ok_or_else(|| {
            ResolveError::NotFound {
                type_path: type_path.to_string(),
            }
        })?;

        if !is_root {
            resolved.installed = type_path.under(self.installed_root).exists();
        }

        if self.no_deps {
            return Ok(DependencyNode {
                resolved,
                manifest,
                children: Vec::new(),
            });
        }

        self.stack.push(type_path.to_string());
        self.on_stack.insert(type_path.to_string());

        let mut children = Vec::new();
        for reference in extract_references(&manifest) {
            if self.on_stack.contains(&reference) {
                let mut chain = self.stack.clone();
                chain.push(reference);
                return Err(ResolveError::Cycle { chain });
            }

            let child_path = TypePath::parse(&reference)?;
            debug!(parent = %type_path, reference = %child_path, "Resolving reference");
            children.push(self.visit(&child_path, false)?);
        }

        self.stack.pop();
        self.on_stack.remove(type_path.as_str());

        Ok(DependencyNode {
            resolved,
            manifest,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::write_type;
    use agentkit_types::manifest::Category;

    fn catalog(root: &Path) -> Vec<Source> {
        vec![Source::new("catalog", root)]
    }

    #[test]
    fn leaf_types_have_no_children() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "skills/test/basic-skill", "1.0.0", "");

        let tree = build_tree(
            "skills/test/basic-skill",
            &catalog(tmp.path()),
            &tmp.path().join("installed"),
            false,
        )
        .unwrap();
        assert_eq!(tree.resolved.category, Category::Skill);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn prompt_references_resolve_in_declaration_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "personas/x", "1.0.0", "");
        write_type(tmp.path(), "contexts/y", "1.0.0", "");
        write_type(tmp.path(), "skills/a", "1.0.0", "");
        write_type(tmp.path(), "workflows/w", "1.0.0", "steps:\n  - id: s\n    skill: skills/a\n");
        write_type(
            tmp.path(),
            "prompts/p",
            "1.0.0",
            "persona: personas/x\ncontext: [contexts/y]\nskills: [skills/a]\nworkflows: [workflows/w]\n",
        );

        let tree = build_tree("prompts/p", &catalog(tmp.path()), &tmp.path().join("i"), false).unwrap();
        let children: Vec<&str> = tree
            .children
            .iter()
            .map(|c| c.resolved.type_path.as_str())
            .collect();
        assert_eq!(children, vec!["personas/x", "contexts/y", "skills/a", "workflows/w"]);
        assert_eq!(tree.children[3].children[0].resolved.type_path, "skills/a");
    }

    #[test]
    fn no_deps_resolves_only_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "personas/x", "1.0.0", "context: [contexts/missing]\n");

        let tree = build_tree("personas/x", &catalog(tmp.path()), &tmp.path().join("i"), true).unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn missing_reference_aborts_with_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "skills/a", "1.0.0", "");
        write_type(
            tmp.path(),
            "workflows/w",
            "1.0.0",
            "steps:\n  - id: one\n    skill: skills/a\n  - id: two\n    skill: skills/deep/missing\n",
        );
        write_type(tmp.path(), "prompts/p", "1.0.0", "workflows: [workflows/w]\n");

        let err = build_tree("prompts/p", &catalog(tmp.path()), &tmp.path().join("i"), false).unwrap_err();
        match err {
            ResolveError::NotFound { type_path } => assert_eq!(type_path, "skills/deep/missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_root_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build_tree("prompts/none", &catalog(tmp.path()), tmp.path(), false).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn reference_back_into_the_chain_is_a_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "contexts/b", "1.0.0", "");
        write_type(tmp.path(), "personas/a", "1.0.0", "context: [contexts/b]\n");

        // Valid manifests cannot loop through the category layering, so seed
        // the chain with the context to exercise the guard.
        let sources = catalog(tmp.path());
        let mut builder = TreeBuilder {
            sources: &sources,
            installed_root: tmp.path(),
            no_deps: false,
            stack: vec!["contexts/b".to_owned()],
            on_stack: HashSet::from(["contexts/b".to_owned()]),
        };
        let err = builder
            .visit(&TypePath::parse("personas/a").unwrap(), false)
            .unwrap_err();
        match err {
            ResolveError::Cycle { chain } => {
                assert_eq!(chain, vec!["contexts/b", "personas/a", "contexts/b"]);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        write_type(tmp.path(), "contexts/shared", "1.0.0", "");
        write_type(tmp.path(), "personas/x", "1.0.0", "context: [contexts/shared]\n");
        write_type(
            tmp.path(),
            "prompts/p",
            "1.0.0",
            "persona: personas/x\ncontext: [contexts/shared]\n",
        );

        let tree = build_tree("prompts/p", &catalog(tmp.path()), &tmp.path().join("i"), false).unwrap();
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn installed_references_are_marked_but_root_is_not() {
        let tmp = tempfile::tempdir().unwrap();
        let installed = tmp.path().join("installed");
        write_type(tmp.path(), "contexts/go", "1.0.0", "");
        write_type(tmp.path(), "personas/x", "1.0.0", "context: [contexts/go]\n");
        std::fs::create_dir_all(installed.join("contexts").join("go")).unwrap();
        std::fs::create_dir_all(installed.join("personas").join("x")).unwrap();

        let tree = build_tree("personas/x", &catalog(tmp.path()), &installed, false).unwrap();
        assert!(!tree.resolved.installed);
        assert!(tree.children[0].resolved.installed);
    }
}
