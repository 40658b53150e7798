use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tokio::{
    fs::{create_dir_all, File},
    io::AsyncWriteExt,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::template::{is_valid_param_name, placeholders, render, Params};
use super::templates::TemplateSet;
use super::ScaffoldError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
    pub template: &'static str,
    pub unresolved: Vec<String>,
}

/// Problems found by [`check`]. Nothing here stops a non-strict render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Template file name and the placeholders it would leave unresolved.
    pub unresolved: Vec<(String, Vec<String>)>,
    /// Provided parameters that no template references.
    pub unused: Vec<String>,
    pub invalid_names: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.unused.is_empty() && self.invalid_names.is_empty()
    }
}

/// Merge `--set` pairs and `--keyword` values into one parameter map.
/// Keywords become a JSON string list fragment, e.g. `"react", "blog"`.
pub fn build_params(set: &[(String, String)], keywords: &[String]) -> Params {
    let mut params: Params = set.iter().cloned().collect();
    if !keywords.is_empty() {
        let fragment = keywords
            .iter()
            .map(|k| serde_json::Value::String(k.clone()).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        params.insert("keywords".to_string(), fragment);
    }
    params
}

pub fn check(set: &TemplateSet, params: &Params) -> CheckReport {
    let mut report = CheckReport::default();
    let mut referenced = BTreeSet::new();

    for template in set.iter() {
        for placeholder in placeholders(template.output)
            .into_iter()
            .chain(placeholders(&template.contents))
        {
            referenced.insert(placeholder.name);
        }

        let mut unresolved = render(template.output, params).unresolved;
        for name in render(&template.contents, params).unresolved {
            if !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }
        if !unresolved.is_empty() {
            report
                .unresolved
                .push((template.file_name.to_string(), unresolved));
        }
    }

    for name in params.keys() {
        if !is_valid_param_name(name) {
            report.invalid_names.push(name.clone());
        } else if !referenced.contains(name) {
            report.unused.push(name.clone());
        }
    }

    report
}

/// Render every template and its output path.
///
/// Unresolved placeholders pass through unless `strict`. Rendered `.json`
/// files must parse. Output paths must be relative and stay inside the project.
pub fn render_all(
    set: &TemplateSet,
    params: &Params,
    strict: bool,
) -> Result<Vec<RenderedFile>, ScaffoldError> {
    let mut files = Vec::new();

    for template in set.iter() {
        let path_render = render(template.output, params);
        let path = PathBuf::from(path_render.text);
        ensure_relative(&path)?;

        let rendered = render(&template.contents, params);
        let mut unresolved = path_render.unresolved;
        for name in rendered.unresolved {
            if !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }
        if strict && !unresolved.is_empty() {
            return Err(ScaffoldError::Unresolved {
                template: template.file_name.to_string(),
                names: unresolved,
            });
        }

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str::<serde_json::Value>(&rendered.text).map_err(|e| {
                ScaffoldError::InvalidJson {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        files.push(RenderedFile {
            path,
            contents: rendered.text,
            template: template.file_name,
            unresolved,
        });
    }

    Ok(files)
}

fn ensure_relative(path: &Path) -> Result<(), ScaffoldError> {
    let safe = !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(ScaffoldError::UnsafePath(path.to_path_buf()))
    }
}

/// Write rendered files under `output`. Without `force`, any existing target
/// aborts the run before a single file is written.
pub async fn write_files(
    files: &[RenderedFile],
    output: &Path,
    force: bool,
) -> Result<Vec<PathBuf>, ScaffoldError> {
    let targets: Vec<PathBuf> = files.iter().map(|f| output.join(&f.path)).collect();

    if !force {
        let mut existing = Vec::new();
        for target in &targets {
            if tokio::fs::try_exists(target)
                .await
                .map_err(|e| ScaffoldError::io(target, e))?
            {
                existing.push(target.clone());
            }
        }
        if !existing.is_empty() {
            return Err(ScaffoldError::AlreadyExists(existing));
        }
    }

    for (file, target) in files.iter().zip(&targets) {
        if let Some(parent) = target.parent() {
            create_dir_all(parent)
                .await
                .map_err(|e| ScaffoldError::io(parent, e))?;
        }
        let mut out = File::create(target)
            .await
            .map_err(|e| ScaffoldError::io(target, e))?;
        out.write_all(file.contents.as_bytes())
            .await
            .map_err(|e| ScaffoldError::io(target, e))?;
        out.flush().await.map_err(|e| ScaffoldError::io(target, e))?;
        tracing::info!("Wrote {}", target.display());
    }

    Ok(targets)
}

/// Pack rendered files into one zip archive at `archive`, entries named
/// relative to the project root. An existing archive is replaced only with `force`.
pub fn write_zip(
    files: &[RenderedFile],
    archive: &Path,
    force: bool,
) -> Result<PathBuf, ScaffoldError> {
    if !force && archive.exists() {
        return Err(ScaffoldError::AlreadyExists(vec![archive.to_path_buf()]));
    }
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
    }

    let zip_err = |source| ScaffoldError::Archive {
        path: archive.to_path_buf(),
        source,
    };
    let out = std::fs::File::create(archive).map_err(|e| ScaffoldError::io(archive, e))?;
    let mut writer = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        writer
            .start_file(entry_name(&file.path), options)
            .map_err(zip_err)?;
        writer
            .write_all(file.contents.as_bytes())
            .map_err(|e| ScaffoldError::io(archive, e))?;
    }
    writer.finish().map_err(zip_err)?;

    tracing::info!("Packed {} files into {}", files.len(), archive.display());
    Ok(archive.to_path_buf())
}

/// Zip entry names always use `/`, whatever the host separator.
fn entry_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn find<'a>(files: &'a [RenderedFile], template: &str) -> &'a RenderedFile {
        files.iter().find(|f| f.template == template).unwrap()
    }

    #[test]
    fn component_renders_name_and_classes() {
        let files = render_all(
            &TemplateSet::bundled(),
            &params(&[
                ("component_name", "Button"),
                ("base_classes", "rounded-lg p-4"),
                ("project_name", "shop"),
            ]),
            true,
        )
        .unwrap();

        let component = find(&files, "component.js.tpl");
        assert_eq!(component.path, PathBuf::from("src/components/Button.js"));
        assert!(component.contents.contains("const Button = ("));
        assert!(component.contents.contains("'rounded-lg p-4'"));
        assert!(!component.contents.contains("{{ component_name"));
        assert!(!component.contents.contains("{{ base_classes"));
    }

    #[test]
    fn package_json_uses_declared_defaults() {
        let files = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop")]),
            true,
        )
        .unwrap();

        let manifest = find(&files, "package.json.tpl");
        let json: serde_json::Value = serde_json::from_str(&manifest.contents).unwrap();
        assert_eq!(json["name"], "shop");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["license"], "MIT");
        assert_eq!(json["keywords"], serde_json::json!(["react"]));
        assert_eq!(json["dependencies"]["react"], "^18.2.0");
        assert_eq!(json["dependencies"]["react-dom"], "^18.2.0");
        assert_eq!(json["dependencies"]["react-scripts"], "5.0.1");
        assert!(json["scripts"]["lint"].is_string());
    }

    #[test]
    fn keywords_become_a_json_list() {
        let p = build_params(
            &[("project_name".to_string(), "shop".to_string())],
            &["react".to_string(), "say \"hi\"".to_string()],
        );
        let files = render_all(&TemplateSet::bundled(), &p, true).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&find(&files, "package.json.tpl").contents).unwrap();
        assert_eq!(json["keywords"], serde_json::json!(["react", "say \"hi\""]));
    }

    #[test]
    fn missing_project_name_passes_through_unless_strict() {
        let files = render_all(&TemplateSet::bundled(), &Params::new(), false).unwrap();
        let index = find(&files, "index.html.tpl");
        assert!(index.contents.contains("<title>{{ project_name }}</title>"));
        assert_eq!(index.unresolved, vec!["project_name"]);

        let err = render_all(&TemplateSet::bundled(), &Params::new(), true).unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::Unresolved { ref names, .. } if names == &vec!["project_name".to_string()]
        ));
    }

    #[test]
    fn broken_manifest_is_rejected() {
        let err = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop"), ("keywords", "not json")]),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::InvalidJson { ref path, .. } if path == Path::new("package.json")
        ));
    }

    #[test]
    fn component_name_cannot_escape_output_dir() {
        let err = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop"), ("component_name", "../../evil")]),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ScaffoldError::UnsafePath(_)));
    }

    #[test]
    fn check_reports_unresolved_unused_and_invalid() {
        let report = check(
            &TemplateSet::bundled(),
            &params(&[("colour", "red"), ("bad-name", "x"), ("author", "Ada")]),
        );
        assert_eq!(
            report.unresolved,
            vec![
                ("index.html.tpl".to_string(), vec!["project_name".to_string()]),
                ("package.json.tpl".to_string(), vec!["project_name".to_string()]),
            ]
        );
        assert_eq!(report.unused, vec!["colour"]);
        assert_eq!(report.invalid_names, vec!["bad-name"]);
        assert!(!report.is_clean());

        let clean = check(&TemplateSet::bundled(), &params(&[("project_name", "shop")]));
        assert!(clean.is_clean());
    }

    #[tokio::test]
    async fn write_refuses_to_clobber_without_force() {
        let out = tempfile::tempdir().unwrap();
        let files = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop")]),
            true,
        )
        .unwrap();

        let written = write_files(&files, out.path(), false).await.unwrap();
        assert_eq!(written.len(), 3);
        assert!(out.path().join("src/components/App.js").exists());
        assert!(out.path().join("public/index.html").exists());

        std::fs::write(out.path().join("package.json"), "{}").unwrap();
        let err = write_files(&files, out.path(), false).await.unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(ref p) if p.len() == 3));
        assert_eq!(
            std::fs::read_to_string(out.path().join("package.json")).unwrap(),
            "{}"
        );

        write_files(&files, out.path(), true).await.unwrap();
        assert_ne!(
            std::fs::read_to_string(out.path().join("package.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn zip_holds_every_file_under_project_paths() {
        use std::io::Read;

        let out = tempfile::tempdir().unwrap();
        let archive = out.path().join("dist/shop.zip");
        let files = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop"), ("component_name", "Card")]),
            true,
        )
        .unwrap();

        write_zip(&files, &archive, false).unwrap();

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["package.json", "public/index.html", "src/components/Card.js"]
        );

        let mut manifest = String::new();
        zip.by_name("package.json")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert_eq!(manifest, find(&files, "package.json.tpl").contents);
    }

    #[test]
    fn zip_refuses_to_replace_archive_without_force() {
        let out = tempfile::tempdir().unwrap();
        let archive = out.path().join("shop.zip");
        std::fs::write(&archive, "old").unwrap();
        let files = render_all(
            &TemplateSet::bundled(),
            &params(&[("project_name", "shop")]),
            true,
        )
        .unwrap();

        let err = write_zip(&files, &archive, false).unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(ref p) if p == &vec![archive.clone()]));
        assert_eq!(std::fs::read_to_string(&archive).unwrap(), "old");

        write_zip(&files, &archive, true).unwrap();
        assert!(zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).is_ok());
    }
}
