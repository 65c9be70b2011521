//! Default options from TOML files.
//!
//! Files are read in order: `~/.config/pdf-toolbox/config.toml`, then
//! `./.pdf-toolbox.toml`. Keys in a later file override the same keys in an
//! earlier one; keys it does not mention keep their earlier value. Missing
//! files are ignored, unparsable ones are skipped with a warning.

use std::path::{Path, PathBuf};

use toolbox_core::options::{OptionKey, ToolOptions};

pub const APP_DIR: &str = "pdf-toolbox";
pub const LOCAL_CONFIG: &str = ".pdf-toolbox.toml";

/// Config file locations, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_DIR).join("config.toml"));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

pub fn load_config() -> ToolOptions {
    load_from(&config_paths())
}

/// Merge the given files key by key and build options from the result.
pub fn load_from(paths: &[PathBuf]) -> ToolOptions {
    let mut merged = toml::Table::new();
    for path in paths {
        if let Some(table) = read_table(path) {
            log::debug!("Loaded config {}", path.display());
            merge_tables(&mut merged, table);
        }
    }

    match toml::Value::Table(merged).try_into::<ToolOptions>() {
        Ok(opts) => clamped(opts),
        Err(e) => {
            log::warn!("Ignoring config: {}", e);
            ToolOptions::default()
        }
    }
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let contents = std::fs::read_to_string(path).ok()?;
    match contents.parse::<toml::Table>() {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Pass every value through `ToolOptions::set` so file values obey the
/// same ranges as command-line ones. Rejected values fall back to the default.
fn clamped(mut opts: ToolOptions) -> ToolOptions {
    let defaults = ToolOptions::default();
    for key in OptionKey::ALL {
        let value = opts.get(key);
        if let Err(e) = opts.set(key.name(), &value) {
            log::warn!("Config value for {}: {}", key, e);
            if let Err(e) = opts.set(key.name(), &defaults.get(key)) {
                log::warn!("Default for {}: {}", key, e);
            }
        }
    }
    opts
}

/// The effective options as TOML, for `--dump-config`.
pub fn to_toml(opts: &ToolOptions) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_core::options::{CompressionLevel, ImageFormat};

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let opts = load_from(&[dir.path().join("nope.toml")]);
        assert_eq!(opts, ToolOptions::default());
    }

    #[test]
    fn test_later_file_overrides_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "global.toml",
            "compression_level = \"high\"\nfont_size = 14.0\n",
        );
        let local = write(dir.path(), "local.toml", "font_size = 9.0\nimage_format = \"png\"\n");

        let opts = load_from(&[global, local]);
        assert_eq!(opts.compression_level, CompressionLevel::High);
        assert_eq!(opts.font_size, 9.0);
        assert_eq!(opts.image_format, ImageFormat::Png);
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.toml", "dpi = 300\n");
        let bad = write(dir.path(), "bad.toml", "dpi = [unterminated\n");
        let opts = load_from(&[good, bad]);
        assert_eq!(opts.dpi, 300);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "c.toml", "font_size = 500.0\njpeg_quality = 0\n");
        let opts = load_from(&[path]);
        assert_eq!(opts.font_size, 72.0);
        assert_eq!(opts.jpeg_quality, 1);
    }

    #[test]
    fn test_non_finite_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "c.toml",
            "font_size = nan\nmargin_mm = inf\nline_height = 2.0\n",
        );
        let opts = load_from(&[path]);
        assert_eq!(opts.font_size, 12.0);
        assert_eq!(opts.margin_mm, 20.0);
        assert_eq!(opts.line_height, 2.0);
    }

    #[test]
    fn test_dump_lists_only_option_keys() {
        let dumped = to_toml(&ToolOptions::default()).unwrap();
        let table: toml::Table = dumped.parse().unwrap();
        for key in table.keys() {
            assert!(OptionKey::from_name(key).is_some(), "unexpected key {}", key);
        }
        assert!(!table.contains_key("verbose"));
    }

    #[test]
    fn test_dump_reloads() {
        let mut opts = ToolOptions::default();
        opts.dpi = 220;
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "dump.toml", &to_toml(&opts).unwrap());
        assert_eq!(load_from(&[path]), opts);
    }
}
