use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub log_dir: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        Self::with_root(project_root)
    }

    pub fn with_root(project_root: PathBuf) -> Self {
        let log_dir = project_root.join("logs");
        let config_path = env::var("WINE_RAG_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("config.yml"));

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            log_dir,
            config_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("WINE_RAG_ROOT") {
        return PathBuf::from(root);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
