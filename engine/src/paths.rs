use crate::palette::ThemeVariant;
use std::path::{Path, PathBuf};

/// Files that belong to one theme variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPaths {
    /// Template shipped with walsync
    pub template_source: PathBuf,
    /// Where pywal looks for user templates
    pub template_destination: PathBuf,
    /// File pywal renders from the template
    pub cache_source: PathBuf,
}

/// Every path the daemon touches. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePaths {
    pub colors_file: PathBuf,
    pub dark: VariantPaths,
    pub light: VariantPaths,
    /// Theme file the editor loads
    pub cache_destination: PathBuf,
    /// Copied into a missing cache source so the editor has something to load
    pub fallback_theme: PathBuf,
}

impl ThemePaths {
    /// Default pywal + base46 layout below `home`
    pub fn under_home(home: &Path, templates_dir: &Path) -> Self {
        let themes = home.join(".local/share/nvim/lazy/base46/lua/base46/themes");
        let wal_cache = home.join(".cache/wal");
        let wal_templates = home.join(".config/wal/templates");

        Self {
            colors_file: wal_cache.join("colors"),
            dark: VariantPaths {
                template_source: templates_dir.join("dark.lua"),
                template_destination: wal_templates.join("base46-dark.lua"),
                cache_source: wal_cache.join("base46-dark.lua"),
            },
            light: VariantPaths {
                template_source: templates_dir.join("light.lua"),
                template_destination: wal_templates.join("base46-light.lua"),
                cache_source: wal_cache.join("base46-light.lua"),
            },
            cache_destination: themes.join("chadwal.lua"),
            fallback_theme: themes.join("gruvchad.lua"),
        }
    }

    pub fn variant(&self, variant: ThemeVariant) -> &VariantPaths {
        match variant {
            ThemeVariant::Dark => &self.dark,
            ThemeVariant::Light => &self.light,
        }
    }

    /// Cache files whose changes trigger an apply
    pub fn tracked_files(&self) -> [&Path; 2] {
        [
            self.dark.cache_source.as_path(),
            self.light.cache_source.as_path(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = ThemePaths::under_home(Path::new("/home/u"), Path::new("/opt/walsync"));

        assert_eq!(paths.colors_file, Path::new("/home/u/.cache/wal/colors"));
        assert_eq!(
            paths.variant(ThemeVariant::Light).template_destination,
            Path::new("/home/u/.config/wal/templates/base46-light.lua")
        );
        assert_eq!(
            paths.dark.template_source,
            Path::new("/opt/walsync/dark.lua")
        );
        assert!(paths.cache_destination.ends_with("base46/themes/chadwal.lua"));
    }
}
