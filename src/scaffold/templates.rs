use std::path::{Path, PathBuf};

use super::ScaffoldError;

pub static COMPONENT: &str = include_str!("../../templates/scaffold/component.js.tpl");
pub static INDEX_HTML: &str = include_str!("../../templates/scaffold/index.html.tpl");
pub static PACKAGE_JSON: &str = include_str!("../../templates/scaffold/package.json.tpl");

/// (template file name, output path template, bundled contents)
static TEMPLATE_MAP: [(&str, &str, &str); 3] = [
    (
        "component.js.tpl",
        "src/components/{{ component_name|default:'App' }}.js",
        COMPONENT,
    ),
    ("index.html.tpl", "public/index.html", INDEX_HTML),
    ("package.json.tpl", "package.json", PACKAGE_JSON),
];

#[derive(Debug, Clone)]
pub struct ScaffoldTemplate {
    pub file_name: &'static str,
    /// Output path relative to the project root; rendered like the contents.
    pub output: &'static str,
    pub contents: String,
    /// Where the contents came from when overridden on disk.
    pub custom_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<ScaffoldTemplate>,
}

impl TemplateSet {
    pub fn bundled() -> Self {
        let templates = TEMPLATE_MAP
            .iter()
            .map(|&(file_name, output, contents)| ScaffoldTemplate {
                file_name,
                output,
                contents: contents.to_string(),
                custom_path: None,
            })
            .collect();
        Self { templates }
    }

    /// Bundled templates, with any same-named file in `dir` taking precedence.
    pub async fn load(dir: Option<&Path>) -> Result<Self, ScaffoldError> {
        let mut set = Self::bundled();
        let Some(dir) = dir else {
            return Ok(set);
        };

        if !tokio::fs::try_exists(dir)
            .await
            .map_err(|e| ScaffoldError::io(dir, e))?
        {
            return Err(ScaffoldError::MissingTemplateDir(dir.to_path_buf()));
        }

        for template in &mut set.templates {
            let path = dir.join(template.file_name);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    tracing::info!("Using template override {}", path.display());
                    template.contents = contents;
                    template.custom_path = Some(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(ScaffoldError::io(&path, e)),
            }
        }

        Ok(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScaffoldTemplate> {
        self.templates.iter()
    }

    pub fn get(&self, file_name: &str) -> Option<&ScaffoldTemplate> {
        self.templates.iter().find(|t| t.file_name == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::template::placeholders;

    fn required(contents: &str) -> Vec<String> {
        placeholders(contents)
            .into_iter()
            .filter(|p| p.default.is_none())
            .map(|p| p.name)
            .collect()
    }

    #[test]
    fn bundled_set_has_three_templates() {
        let set = TemplateSet::bundled();
        let names: Vec<&str> = set.iter().map(|t| t.file_name).collect();
        assert_eq!(
            names,
            vec!["component.js.tpl", "index.html.tpl", "package.json.tpl"]
        );
        assert!(set.iter().all(|t| t.custom_path.is_none()));
    }

    #[test]
    fn project_name_is_required_where_declared() {
        let set = TemplateSet::bundled();
        assert!(required(&set.get("component.js.tpl").unwrap().contents).is_empty());
        assert_eq!(
            required(&set.get("index.html.tpl").unwrap().contents),
            vec!["project_name"]
        );
        assert_eq!(
            required(&set.get("package.json.tpl").unwrap().contents),
            vec!["project_name"]
        );
    }

    #[tokio::test]
    async fn directory_overrides_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html.tpl"), "<h1>{{ project_name }}</h1>").unwrap();
        std::fs::write(dir.path().join("unrelated.tpl"), "ignored").unwrap();

        let set = TemplateSet::load(Some(dir.path())).await.unwrap();
        let index = set.get("index.html.tpl").unwrap();
        assert_eq!(index.contents, "<h1>{{ project_name }}</h1>");
        assert_eq!(index.custom_path, Some(dir.path().join("index.html.tpl")));

        let component = set.get("component.js.tpl").unwrap();
        assert_eq!(component.contents, COMPONENT);
        assert_eq!(set.iter().count(), 3);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            TemplateSet::load(Some(&missing)).await,
            Err(ScaffoldError::MissingTemplateDir(_))
        ));
    }
}
