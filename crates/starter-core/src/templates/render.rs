//! Template rendering with Tera

use crate::config::Config;
use crate::error::{Result, StarterError};
use crate::project::ProjectContext;
use crate::workflow::Layout;
use tera::{Context, Tera};

/// Build the variables available to every template
///
/// Config answers come first, then the values shared through the project
/// context, then the paths derived for this run.
pub fn template_context(config: &Config, project: &ProjectContext, layout: &Layout) -> Context {
    let mut context = Context::new();

    context.insert("composer", &config.composer);
    context.insert("drupal_version", &config.drupal_version);
    context.insert("features", &config.features);
    context.insert("drupal_theme", &config.drupal_theme);
    context.insert("install_drupal", &config.install_drupal);

    context.insert("name", &project.name);
    context.insert("platform", &project.platform);
    context.insert("services", &project.services);
    context.insert("answers", &project.answers);
    context.insert(
        "deployment",
        &project.deployment.as_ref().map(|d| &d.config),
    );

    context.insert("doc_root", &layout.doc_root);
    context.insert("theme_path", &layout.theme_path);
    context.insert("build_path", &layout.build_path);

    context
}

/// Render one template file
///
/// UTF-8 content goes through Tera without autoescaping. Anything else is
/// returned unchanged so binary assets can live in the template tree.
pub fn render(path: &str, content: &[u8], context: &Context) -> Result<Vec<u8>> {
    let Ok(text) = std::str::from_utf8(content) else {
        return Ok(content.to_vec());
    };

    Tera::one_off(text, context, false)
        .map(String::into_bytes)
        .map_err(|source| StarterError::Template {
            path: path.to_string(),
            source,
        })
}
