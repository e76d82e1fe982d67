//! Loads the project configuration. A project is a directory containing a
//! `site.yaml` file, which names the pages directory, the output directory and
//! the theme file, and carries the site metadata made available to templates.
//! The theme file in turn names the templates directory and an optional
//! directory of raw files copied verbatim into the output.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "site.yaml";

#[derive(Deserialize)]
#[serde(default)]
struct Project {
    pages_dir: PathBuf,
    output_dir: PathBuf,
    theme_file: PathBuf,

    #[serde(flatten)]
    site: Site,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            pages_dir: PathBuf::from("pages"),
            output_dir: PathBuf::from("out"),
            theme_file: PathBuf::from("theme/theme.yaml"),
            site: Site::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct Theme {
    theme_name: String,
    templates_dir: PathBuf,
    raw_files_dir: Option<PathBuf>,
    base_templates: Vec<PathBuf>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            theme_name: String::new(),
            templates_dir: PathBuf::from("templates"),
            raw_files_dir: None,
            base_templates: Vec::new(),
        }
    }
}

/// Site-wide metadata, available to every template as `site`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Site {
    pub title: String,
    pub author: String,
    pub description: String,

    /// How many recent pages a home page template should list.
    pub recent_posts: usize,

    /// Google Analytics tag, if any.
    pub gtag: Option<String>,

    pub generator: String,
}

impl Default for Site {
    fn default() -> Self {
        Site {
            title: String::new(),
            author: String::new(),
            description: String::new(),
            recent_posts: 10,
            gtag: None,
            generator: env!("CARGO_PKG_NAME").to_owned(),
        }
    }
}

impl Site {
    pub fn ga_enabled(&self) -> bool {
        self.gtag.as_deref().map_or(false, |tag| !tag.trim().is_empty())
    }
}

/// The resolved project configuration. All paths are absolute or relative to
/// the working directory.
#[derive(Clone, Debug)]
pub struct Config {
    pub project_file: PathBuf,
    pub pages_directory: PathBuf,
    pub output_directory: PathBuf,
    pub theme_name: String,
    pub templates_directory: PathBuf,
    pub raw_files_directory: Option<PathBuf>,
    pub base_templates: Vec<PathBuf>,
    pub site: Site,
}

impl Config {
    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
            current = dir.parent();
        }
        Err(Error::ProjectFileNotFound(dir.to_owned()))
    }

    /// Loads the project file at `path` and the theme file it names, and
    /// checks that every configured directory exists.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project: Project = read_yaml(path, "Site config file")?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));

        let theme_file = project_root.join(&project.theme_file);
        let theme: Theme = read_yaml(&theme_file, "Theme config file")?;
        let theme_root = theme_file.parent().unwrap_or_else(|| Path::new("."));
        let templates_directory = theme_root.join(&theme.templates_dir);

        let config = Config {
            project_file: path.to_owned(),
            pages_directory: project_root.join(&project.pages_dir),
            output_directory: project_root.join(&project.output_dir),
            theme_name: theme.theme_name,
            raw_files_directory: theme.raw_files_dir.map(|dir| theme_root.join(dir)),
            base_templates: theme
                .base_templates
                .iter()
                .map(|relpath| templates_directory.join(relpath))
                .collect(),
            templates_directory,
            site: project.site,
        };

        check_directory(&config.pages_directory, "Pages directory")?;
        check_directory(&config.templates_directory, "Templates directory")?;
        if let Some(raw) = &config.raw_files_directory {
            check_directory(raw, "Raw files directory")?;
        }
        Ok(config)
    }

    /// The directory containing the project file. This is the root watched
    /// for changes.
    pub fn project_directory(&self) -> &Path {
        self.project_file.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path, kind: &'static str) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::Open {
        kind,
        path: path.to_owned(),
        err,
    })?;
    serde_yaml::from_reader(file).map_err(|err| Error::Parse {
        path: path.to_owned(),
        err,
    })
}

/// Returns [`Error::MissingDirectory`] unless `path` is a directory.
pub fn check_directory(path: &Path, kind: &'static str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingDirectory {
            kind,
            path: path.to_owned(),
        })
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in a directory or its ancestors.
    ProjectFileNotFound(PathBuf),

    /// Returned when a configuration file can't be opened.
    Open {
        kind: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a configuration file isn't valid YAML for its schema.
    Parse { path: PathBuf, err: serde_yaml::Error },

    /// Returned when a configured directory doesn't exist.
    MissingDirectory { kind: &'static str, path: PathBuf },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound(dir) => write!(
                f,
                "Could not find `{}` in '{}' or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Open { kind, path, err } => {
                write!(f, "{} not found: {}: {}", kind, path.display(), err)
            }
            Error::Parse { path, err } => write!(f, "Parsing '{}': {}", path.display(), err),
            Error::MissingDirectory { kind, path } => {
                write!(f, "{} not found: {}", kind, path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound(_) => None,
            Error::Open { err, .. } => Some(err),
            Error::Parse { err, .. } => Some(err),
            Error::MissingDirectory { .. } => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn project(root: &Path, site_yaml: &str) -> std::io::Result<()> {
        fs::create_dir_all(root.join("pages"))?;
        fs::create_dir_all(root.join("theme/templates"))?;
        fs::create_dir_all(root.join("theme/raw"))?;
        fs::write(root.join(PROJECT_FILE), site_yaml)?;
        fs::write(
            root.join("theme/theme.yaml"),
            "theme_name: plain\nraw_files_dir: raw\nbase_templates: [base.html]\n",
        )
    }

    #[test]
    fn test_from_directory_searches_parents(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        project(dir.path(), "title: My Book\nauthor: Someone\ngtag: G-123\n")?;
        fs::create_dir_all(dir.path().join("pages/10 Chapter"))?;

        let config = Config::from_directory(&dir.path().join("pages/10 Chapter"))?;
        assert_eq!(dir.path().join(PROJECT_FILE), config.project_file);
        assert_eq!(dir.path().join("pages"), config.pages_directory);
        assert_eq!(dir.path().join("out"), config.output_directory);
        assert_eq!(dir.path().join("theme/templates"), config.templates_directory);
        assert_eq!(Some(dir.path().join("theme/raw")), config.raw_files_directory);
        assert_eq!(vec![dir.path().join("theme/templates/base.html")], config.base_templates);
        assert_eq!("plain", config.theme_name);
        assert_eq!("My Book", config.site.title);
        assert_eq!(10, config.site.recent_posts);
        assert!(config.site.ga_enabled());
        assert_eq!(dir.path(), config.project_directory());
        Ok(())
    }

    #[test]
    fn test_missing_pages_directory() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        project(dir.path(), "pages_dir: chapters\n")?;
        match Config::from_directory(dir.path()) {
            Err(Error::MissingDirectory { kind, path }) => {
                assert_eq!("Pages directory", kind);
                assert_eq!(dir.path().join("chapters"), path);
            }
            other => panic!("expected MissingDirectory, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_theme_file() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("pages"))?;
        fs::write(dir.path().join(PROJECT_FILE), "title: x\n")?;
        assert!(matches!(
            Config::from_directory(dir.path()),
            Err(Error::Open { kind: "Theme config file", .. })
        ));
        Ok(())
    }
}
