use folio::scaffold::{self, ScaffoldError, TemplateSet};
use tempfile::TempDir;

fn set(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_generates_complete_project() {
    let out = TempDir::new().unwrap();
    let params = scaffold::build_params(
        &set(&[
            ("project_name", "storefront"),
            ("component_name", "Button"),
            ("base_classes", "rounded-lg p-4"),
            ("author", "Ada"),
        ]),
        &["react".to_string(), "shop".to_string()],
    );

    let templates = TemplateSet::load(None).await.unwrap();
    let files = scaffold::render_all(&templates, &params, true).unwrap();
    scaffold::write_files(&files, out.path(), false)
        .await
        .unwrap();

    let component =
        std::fs::read_to_string(out.path().join("src/components/Button.js")).unwrap();
    assert!(component.contains("const Button = ("));
    assert!(component.contains("'rounded-lg p-4'"));
    assert!(component.contains("export default Button;"));
    assert!(!component.contains("{{"));

    let index = std::fs::read_to_string(out.path().join("public/index.html")).unwrap();
    assert!(index.contains("<title>storefront</title>"));

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("package.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["name"], "storefront");
    assert_eq!(manifest["version"], "1.0.0");
    assert_eq!(manifest["author"], "Ada");
    assert_eq!(manifest["keywords"], serde_json::json!(["react", "shop"]));
    assert_eq!(manifest["scripts"]["start"], "react-scripts start");
}

#[tokio::test]
async fn test_rendering_is_byte_identical_across_runs() {
    let params = scaffold::build_params(&set(&[("project_name", "same")]), &[]);
    let templates = TemplateSet::bundled();
    assert_eq!(
        scaffold::render_all(&templates, &params, false).unwrap(),
        scaffold::render_all(&templates, &params, false).unwrap()
    );
}

#[tokio::test]
async fn test_override_directory_and_strict_mode() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("component.js.tpl"),
        "export const {{ component_name }} = '{{ flavour }}';\n",
    )
    .unwrap();

    let templates = TemplateSet::load(Some(dir.path())).await.unwrap();
    let params = scaffold::build_params(
        &set(&[("project_name", "p"), ("component_name", "Card")]),
        &[],
    );

    let files = scaffold::render_all(&templates, &params, false).unwrap();
    let component = files
        .iter()
        .find(|f| f.template == "component.js.tpl")
        .unwrap();
    assert_eq!(component.contents, "export const Card = '{{ flavour }}';\n");

    let err = scaffold::render_all(&templates, &params, true).unwrap_err();
    assert!(matches!(
        err,
        ScaffoldError::Unresolved { ref template, .. } if template == "component.js.tpl"
    ));

    let report = scaffold::check(&templates, &params);
    assert_eq!(
        report.unresolved,
        vec![("component.js.tpl".to_string(), vec!["flavour".to_string()])]
    );
}

#[tokio::test]
async fn test_exports_project_as_zip() {
    use std::io::Read;

    let out = TempDir::new().unwrap();
    let archive = out.path().join("storefront.zip");
    let params = scaffold::build_params(
        &set(&[("project_name", "storefront"), ("component_name", "Button")]),
        &[],
    );
    let files = scaffold::render_all(&TemplateSet::bundled(), &params, true).unwrap();

    scaffold::write_zip(&files, &archive, false).unwrap();
    assert!(!out.path().join("package.json").exists());

    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 3);
    let mut component = String::new();
    zip.by_name("src/components/Button.js")
        .unwrap()
        .read_to_string(&mut component)
        .unwrap();
    assert!(component.contains("const Button = ("));

    let err = scaffold::write_zip(&files, &archive, false).unwrap_err();
    assert!(matches!(err, ScaffoldError::AlreadyExists(_)));
}
