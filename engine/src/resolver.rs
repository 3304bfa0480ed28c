use crate::common::ResolveError;
use crate::palette::{PaletteState, ThemeVariant};
use crate::paths::{ThemePaths, VariantPaths};
use std::path::Path;
use std::sync::Arc;

/// Picks the active variant from the current palette cache
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    paths: Arc<ThemePaths>,
}

impl ThemeResolver {
    pub fn new(paths: Arc<ThemePaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ThemePaths {
        &self.paths
    }

    /// Read the palette fresh and return the variant with its paths.
    ///
    /// A missing or empty colors file is an error; a malformed color is not
    /// and resolves to [`ThemeVariant::Dark`].
    pub async fn resolve(&self) -> Result<(ThemeVariant, &VariantPaths), ResolveError> {
        let palette = read_palette(&self.paths.colors_file).await?;
        let variant = palette.variant();
        log::info!("Detected {variant} theme from {}", palette.hex_color());
        Ok((variant, self.paths.variant(variant)))
    }
}

/// First line of the colors file, trimmed
pub async fn read_palette(colors_file: &Path) -> Result<PaletteState, ResolveError> {
    let content = tokio::fs::read_to_string(colors_file)
        .await
        .map_err(|source| ResolveError::MissingPalette {
            path: colors_file.to_path_buf(),
            source,
        })?;

    let first = content.lines().next().unwrap_or("").trim();
    if first.is_empty() {
        return Err(ResolveError::EmptyPalette {
            path: colors_file.to_path_buf(),
        });
    }

    Ok(PaletteState::new(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_matches, assert_ok};

    fn resolver_in(dir: &Path) -> ThemeResolver {
        ThemeResolver::new(Arc::new(ThemePaths::under_home(dir, &dir.join("templates"))))
    }

    fn write_colors(dir: &Path, content: &str) {
        let colors = dir.join(".cache/wal/colors");
        std::fs::create_dir_all(colors.parent().unwrap()).unwrap();
        std::fs::write(colors, content).unwrap();
    }

    #[tokio::test]
    async fn test_resolves_dark_palette() {
        let dir = tempfile::tempdir().unwrap();
        write_colors(dir.path(), "#1d1f21\n#cc6666\n#b5bd68\n");
        let resolver = resolver_in(dir.path());

        let (variant, paths) = assert_ok!(resolver.resolve().await);
        assert_eq!(variant, ThemeVariant::Dark);
        assert!(paths.cache_source.ends_with("base46-dark.lua"));
    }

    #[tokio::test]
    async fn test_resolves_light_palette_without_hash() {
        let dir = tempfile::tempdir().unwrap();
        write_colors(dir.path(), "fdf6e3\n");
        let resolver = resolver_in(dir.path());

        let (variant, paths) = assert_ok!(resolver.resolve().await);
        assert_eq!(variant, ThemeVariant::Light);
        assert!(paths.cache_source.ends_with("base46-light.lua"));
    }

    #[tokio::test]
    async fn test_malformed_color_resolves_dark() {
        let dir = tempfile::tempdir().unwrap();
        write_colors(dir.path(), "zzzzzz\n");

        let resolver = resolver_in(dir.path());
        let (variant, _) = assert_ok!(resolver.resolve().await);
        assert_eq!(variant, ThemeVariant::Dark);
    }

    #[tokio::test]
    async fn test_missing_colors_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());
        let result = resolver.resolve().await;
        assert_matches!(result, Err(ResolveError::MissingPalette { .. }));
    }

    #[tokio::test]
    async fn test_empty_first_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_colors(dir.path(), "   \n#ffffff\n");
        let resolver = resolver_in(dir.path());
        let result = resolver.resolve().await;
        assert_matches!(result, Err(ResolveError::EmptyPalette { .. }));
    }
}
