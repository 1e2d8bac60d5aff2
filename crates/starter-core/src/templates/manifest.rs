//! Template manifest: every template path tagged with where it goes
//!
//! The template tree has three subtrees with different destinations:
//! - `public/` renders into the project's document root
//! - `drush/` renders into the project's `drush/` directory
//! - everything else renders into the project root
//!
//! `aliases.drushrc.php` is special. The copy directly under `drush/` is
//! rendered once per project under a project-specific name; other copies
//! outside `public/` are never rendered.

/// Document root subtree of the template tree
pub const DOC_ROOT_TREE: &str = "public";

/// Drush config subtree of the template tree (also the project directory name)
pub const TOOL_TREE: &str = "drush";

/// File name of the site alias template
pub const ALIAS_TEMPLATE: &str = "aliases.drushrc.php";

/// Where a template file ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Under the document root, `public/` prefix replaced
    DocRoot,
    /// Under `drush/` in the project root
    ToolConfig,
    /// The site alias template, rendered once per project
    AliasTemplate,
    /// At the same relative path in the project root
    ProjectRoot,
    /// Not rendered
    Ignored,
}

/// A template path and its destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub destination: Destination,
}

impl ManifestEntry {
    /// Path relative to the destination directory of this entry's category
    ///
    /// For `DocRoot` this is relative to the document root, for `ToolConfig`
    /// relative to `drush/`, otherwise relative to the project root.
    pub fn relative_target(&self) -> &str {
        let prefix = match self.destination {
            Destination::DocRoot => DOC_ROOT_TREE,
            Destination::ToolConfig | Destination::AliasTemplate => TOOL_TREE,
            Destination::ProjectRoot | Destination::Ignored => return &self.path,
        };
        self.path
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.path)
    }
}

/// Template paths partitioned by destination
#[derive(Debug, Clone, Default)]
pub struct TemplateManifest {
    entries: Vec<ManifestEntry>,
}

impl TemplateManifest {
    /// Tag every path once with its destination
    pub fn partition<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let entries = paths
            .into_iter()
            .map(|path| ManifestEntry {
                path: path.to_string(),
                destination: classify(path),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Entries headed for `destination`, in path order
    pub fn of(&self, destination: Destination) -> impl Iterator<Item = &ManifestEntry> {
        self.entries
            .iter()
            .filter(move |e| e.destination == destination)
    }

    /// The alias template entry, if the tree has one
    pub fn alias_template(&self) -> Option<&ManifestEntry> {
        self.of(Destination::AliasTemplate).next()
    }
}

fn classify(path: &str) -> Destination {
    let (top, rest) = match path.split_once('/') {
        Some((top, rest)) => (top, Some(rest)),
        None => (path, None),
    };
    let file_name = path.rsplit('/').next().unwrap_or(path);

    match (top, rest) {
        (DOC_ROOT_TREE, Some(_)) => Destination::DocRoot,
        (TOOL_TREE, Some(ALIAS_TEMPLATE)) => Destination::AliasTemplate,
        (TOOL_TREE, Some(_)) if file_name == ALIAS_TEMPLATE => Destination::Ignored,
        (TOOL_TREE, Some(_)) => Destination::ToolConfig,
        _ if file_name == ALIAS_TEMPLATE => Destination::Ignored,
        _ => Destination::ProjectRoot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination_of(manifest: &TemplateManifest, path: &str) -> Destination {
        manifest
            .entries()
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.destination)
            .unwrap()
    }

    #[test]
    fn test_partition_categories() {
        let manifest = TemplateManifest::partition([
            "public/sites/default/settings.php",
            "public/.htaccess",
            "drush/drushrc.php",
            "drush/policy/policy.drush.inc",
            "drush/aliases.drushrc.php",
            "composer.json",
            ".gitignore",
            "config/sync/.htaccess",
        ]);

        assert_eq!(
            destination_of(&manifest, "public/sites/default/settings.php"),
            Destination::DocRoot
        );
        assert_eq!(destination_of(&manifest, "public/.htaccess"), Destination::DocRoot);
        assert_eq!(destination_of(&manifest, "drush/drushrc.php"), Destination::ToolConfig);
        assert_eq!(
            destination_of(&manifest, "drush/policy/policy.drush.inc"),
            Destination::ToolConfig
        );
        assert_eq!(
            destination_of(&manifest, "drush/aliases.drushrc.php"),
            Destination::AliasTemplate
        );
        assert_eq!(destination_of(&manifest, "composer.json"), Destination::ProjectRoot);
        assert_eq!(destination_of(&manifest, ".gitignore"), Destination::ProjectRoot);
        assert_eq!(
            destination_of(&manifest, "config/sync/.htaccess"),
            Destination::ProjectRoot
        );
    }

    #[test]
    fn test_stray_alias_templates_are_ignored() {
        let manifest = TemplateManifest::partition([
            "aliases.drushrc.php",
            "drush/sites/aliases.drushrc.php",
            "examples/aliases.drushrc.php",
            "public/sites/all/drush/aliases.drushrc.php",
        ]);

        assert_eq!(
            destination_of(&manifest, "aliases.drushrc.php"),
            Destination::Ignored
        );
        assert_eq!(
            destination_of(&manifest, "drush/sites/aliases.drushrc.php"),
            Destination::Ignored
        );
        assert_eq!(
            destination_of(&manifest, "examples/aliases.drushrc.php"),
            Destination::Ignored
        );
        // The document root subtree is copied as-is
        assert_eq!(
            destination_of(&manifest, "public/sites/all/drush/aliases.drushrc.php"),
            Destination::DocRoot
        );
        assert!(manifest.alias_template().is_none());
    }

    #[test]
    fn test_top_level_names_are_not_subtrees() {
        // Files named like a subtree are plain project files
        let manifest = TemplateManifest::partition(["public", "drush", "publicity/readme.md"]);

        for entry in manifest.entries() {
            assert_eq!(entry.destination, Destination::ProjectRoot, "{}", entry.path);
        }
    }

    #[test]
    fn test_relative_targets() {
        let manifest = TemplateManifest::partition([
            "public/sites/default/settings.php",
            "drush/drushrc.php",
            "drush/aliases.drushrc.php",
            "composer.json",
        ]);
        let targets: Vec<&str> = manifest
            .entries()
            .iter()
            .map(ManifestEntry::relative_target)
            .collect();

        assert_eq!(
            targets,
            vec![
                "sites/default/settings.php",
                "drushrc.php",
                "aliases.drushrc.php",
                "composer.json"
            ]
        );
    }

    #[test]
    fn test_every_path_tagged_once() {
        let paths = ["a", "public/b", "drush/c", "drush/aliases.drushrc.php"];
        let manifest = TemplateManifest::partition(paths);
        assert_eq!(manifest.entries().len(), paths.len());

        let counted: usize = [
            Destination::DocRoot,
            Destination::ToolConfig,
            Destination::AliasTemplate,
            Destination::ProjectRoot,
            Destination::Ignored,
        ]
        .into_iter()
        .map(|d| manifest.of(d).count())
        .sum();
        assert_eq!(counted, paths.len());
    }
}
