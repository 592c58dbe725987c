//! Manifest file location within a type directory.
//!
//! Two naming conventions are in use: a category-specific file name
//! (`skill.yaml`, `persona.yaml`, ...) and a generic `manifest.yaml` /
//! `manifest.json`. Both are accepted; the category-specific name wins when a
//! directory carries both.

use std::path::{Path, PathBuf};

use agentkit_types::manifest::Category;

/// Generic manifest file names, in lookup order.
pub const GENERIC_MANIFEST_NAMES: &[&str] = &["manifest.yaml", "manifest.yml", "manifest.json"];

/// Candidate manifest file names for a directory of the given category, in
/// lookup order.
pub fn manifest_candidates(category: Category) -> Vec<String> {
    let stem = category.as_str();
    let mut names = vec![format!("{stem}.yaml"), format!("{stem}.yml")];
    names.extend(GENERIC_MANIFEST_NAMES.iter().map(|n| (*n).to_owned()));
    names
}

/// Find the manifest inside `dir`, if any.
pub fn locate_manifest(dir: &Path, category: Category) -> Option<PathBuf> {
    manifest_candidates(category)
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_category_name() {
        let names = manifest_candidates(Category::Skill);
        assert_eq!(
            names,
            vec![
                "skill.yaml",
                "skill.yml",
                "manifest.yaml",
                "manifest.yml",
                "manifest.json"
            ]
        );
    }

    #[test]
    fn locate_accepts_both_conventions() {
        let tmp = tempfile::tempdir().unwrap();

        let generic = tmp.path().join("generic");
        std::fs::create_dir_all(&generic).unwrap();
        std::fs::write(generic.join("manifest.json"), "{}").unwrap();
        assert_eq!(
            locate_manifest(&generic, Category::Persona),
            Some(generic.join("manifest.json"))
        );

        let both = tmp.path().join("both");
        std::fs::create_dir_all(&both).unwrap();
        std::fs::write(both.join("manifest.yaml"), "").unwrap();
        std::fs::write(both.join("persona.yaml"), "").unwrap();
        assert_eq!(
            locate_manifest(&both, Category::Persona),
            Some(both.join("persona.yaml"))
        );

        // Another category's file name does not count.
        let other = tmp.path().join("other");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join("skill.yaml"), "").unwrap();
        assert_eq!(locate_manifest(&other, Category::Persona), None);
    }
}
