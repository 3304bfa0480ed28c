use serde::Deserialize;
use std::path::{Path, PathBuf};
use walsync_engine::paths::ThemePaths;

pub const DEFAULT_LOCK_FILE: &str = "/tmp/wal_nvim_lock";

/// Templates shipped with walsync, relative to the home directory
pub const DEFAULT_TEMPLATES_DIR: &str = ".config/walsync/templates";

/// Overrides for the filesystem layout. Relative paths are taken from the
/// home directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    colors_file: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    dark_template: Option<PathBuf>,
    light_template: Option<PathBuf>,
    dark_template_destination: Option<PathBuf>,
    light_template_destination: Option<PathBuf>,
    dark_cache: Option<PathBuf>,
    light_cache: Option<PathBuf>,
    destination: Option<PathBuf>,
    fallback_theme: Option<PathBuf>,
    lock_file: Option<PathBuf>,
}

impl PathsConfig {
    pub fn templates_dir(&self, home: &Path) -> PathBuf {
        let dir = self
            .templates_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_TEMPLATES_DIR));
        home.join(dir)
    }

    pub fn lock_file(&self, home: &Path) -> PathBuf {
        let file = self
            .lock_file
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_LOCK_FILE));
        home.join(file)
    }

    /// Default layout below `home` with every configured override applied
    pub fn theme_paths(&self, home: &Path) -> ThemePaths {
        let mut paths = ThemePaths::under_home(home, &self.templates_dir(home));

        let overrides = [
            (&self.colors_file, &mut paths.colors_file),
            (&self.dark_template, &mut paths.dark.template_source),
            (&self.light_template, &mut paths.light.template_source),
            (
                &self.dark_template_destination,
                &mut paths.dark.template_destination,
            ),
            (
                &self.light_template_destination,
                &mut paths.light.template_destination,
            ),
            (&self.dark_cache, &mut paths.dark.cache_source),
            (&self.light_cache, &mut paths.light.cache_source),
            (&self.destination, &mut paths.cache_destination),
            (&self.fallback_theme, &mut paths.fallback_theme),
        ];
        for (configured, target) in overrides {
            if let Some(path) = configured {
                // Joining an absolute path replaces the base
                *target = home.join(path);
            }
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_home() {
        let config = PathsConfig::default();
        let home = Path::new("/home/u");

        let paths = config.theme_paths(home);
        assert_eq!(paths.colors_file, Path::new("/home/u/.cache/wal/colors"));
        assert_eq!(
            paths.dark.template_source,
            Path::new("/home/u/.config/walsync/templates/dark.lua")
        );
        assert_eq!(config.lock_file(home), Path::new("/tmp/wal_nvim_lock"));
    }

    #[test]
    fn test_overrides_accept_relative_and_absolute_paths() {
        let config = PathsConfig {
            colors_file: Some(PathBuf::from("palettes/colors")),
            destination: Some(PathBuf::from("/srv/themes/chadwal.lua")),
            templates_dir: Some(PathBuf::from("/opt/walsync")),
            ..Default::default()
        };

        let paths = config.theme_paths(Path::new("/home/u"));
        assert_eq!(paths.colors_file, Path::new("/home/u/palettes/colors"));
        assert_eq!(paths.cache_destination, Path::new("/srv/themes/chadwal.lua"));
        assert_eq!(paths.light.template_source, Path::new("/opt/walsync/light.lua"));
        assert_eq!(
            paths.light.cache_source,
            Path::new("/home/u/.cache/wal/base46-light.lua")
        );
    }
}
