// React project scaffolding from placeholder templates
pub mod generator;
pub mod template;
pub mod templates;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use generator::{
    build_params, check, render_all, write_files, write_zip, CheckReport, RenderedFile,
};
pub use template::{render, Params, Rendered};
pub use templates::TemplateSet;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template directory {0} does not exist")]
    MissingTemplateDir(PathBuf),

    #[error("{template}: unresolved placeholders: {}", .names.join(", "))]
    Unresolved {
        template: String,
        names: Vec<String>,
    },

    #[error("{path}: rendered manifest is not valid JSON: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("{0}: output path must stay inside the project directory")]
    UnsafePath(PathBuf),

    #[error("{path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Refusing to overwrite existing files (use --force): {}", display_paths(.0))]
    AlreadyExists(Vec<PathBuf>),
}

impl ScaffoldError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ScaffoldError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
