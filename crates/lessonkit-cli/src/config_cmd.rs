//! `lessonkit config show` and `lessonkit config set`.
//!
//! `set` edits the config file with `toml_edit`, so comments and key order
//! survive. The edited document must still parse as a [`ConfigFile`]
//! before it is written back.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::config::{ConfigFile, ResolvedConfig, write_config_text};

/// How a settable key's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Integer,
    Float,
}

/// Keys `config set` accepts.
const SETTABLE_KEYS: &[(&str, &str, ValueKind)] = &[
    ("generation", "api_key", ValueKind::Text),
    ("generation", "model", ValueKind::Text),
    ("generation", "base_url", ValueKind::Text),
    ("generation", "timeout_secs", ValueKind::Integer),
    ("generation", "temperature", ValueKind::Float),
    ("export", "prefix", ValueKind::Text),
    ("export", "output_dir", ValueKind::Text),
];

/// Show the first and last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Print the resolved configuration.
pub fn run_show(resolved: &ResolvedConfig, path: &Path) {
    let file_state = if path.exists() { "" } else { " (not found)" };
    println!("config file: {}{file_state}", path.display());
    println!();
    println!("[generation]");
    match (&resolved.gemini.api_key, resolved.api_key_source) {
        (Some(key), Some(source)) => println!("api_key      = {}  (from {source})", mask_key(key)),
        _ => println!("api_key      = <not set>"),
    }
    println!("model        = {}", resolved.gemini.model);
    println!("base_url     = {}", resolved.gemini.base_url);
    println!("timeout_secs = {}", resolved.gemini.timeout.as_secs());
    match resolved.gemini.temperature {
        Some(t) => println!("temperature  = {t}"),
        None => println!("temperature  = <service default>"),
    }
    println!();
    println!("[export]");
    println!("prefix       = {}", resolved.export_prefix);
    println!("output_dir   = {}", resolved.output_dir.display());
}

/// Set `key` (`section.name`) to `value` in the config file at `path`,
/// creating the file if needed.
pub fn run_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let current = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        String::new()
    };

    let updated = set_value(&current, key, value)?;
    write_config_text(path, &updated)?;

    let shown = if key == "generation.api_key" {
        mask_key(value)
    } else {
        value.to_string()
    };
    println!("{key} = {shown}  ({})", path.display());
    Ok(())
}

/// Return `document` with `key` set to `value`.
pub fn set_value(document: &str, key: &str, value: &str) -> Result<String> {
    let Some((section, name)) = key.split_once('.') else {
        bail!("key must look like section.name, got {key:?}");
    };
    let Some(&(_, _, kind)) = SETTABLE_KEYS
        .iter()
        .find(|(s, n, _)| *s == section && *n == name)
    else {
        let known: Vec<String> = SETTABLE_KEYS
            .iter()
            .map(|(s, n, _)| format!("{s}.{n}"))
            .collect();
        bail!("unknown config key {key:?}; expected one of: {}", known.join(", "));
    };

    let item = match kind {
        ValueKind::Text => toml_edit::value(value),
        ValueKind::Integer => {
            let n: i64 = value
                .parse()
                .with_context(|| format!("{key} must be an integer, got {value:?}"))?;
            toml_edit::value(n)
        }
        ValueKind::Float => {
            let n: f64 = value
                .parse()
                .with_context(|| format!("{key} must be a number, got {value:?}"))?;
            toml_edit::value(n)
        }
    };

    let mut doc: toml_edit::DocumentMut = document
        .parse()
        .context("failed to parse config file as TOML document")?;

    if doc.get(section).is_none() {
        doc.insert(section, toml_edit::table());
    }
    let table = doc
        .get_mut(section)
        .and_then(|v| v.as_table_mut())
        .with_context(|| format!("[{section}] is not a table"))?;
    table.insert(name, item);

    let text = doc.to_string();
    toml::from_str::<ConfigFile>(&text)
        .with_context(|| format!("setting {key} would make the config file invalid"))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_hides_the_middle() {
        assert_eq!(mask_key("AIzaSyExample1234"), "AIza...1234");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn set_creates_missing_section() {
        let text = set_value("", "generation.model", "gemini-2.5-pro").unwrap();
        let file: ConfigFile = toml::from_str(&text).unwrap();
        assert_eq!(file.generation.model, "gemini-2.5-pro");
    }

    #[test]
    fn set_preserves_comments_and_other_keys() {
        let original = "\
# lessonkit settings
[generation]
# personal key
api_key = \"old\"
model = \"gemini-2.5-flash\"

[export]
prefix = \"GiaoAn\"
";
        let text = set_value(original, "generation.api_key", "new-key").unwrap();
        assert!(text.contains("# lessonkit settings"));
        assert!(text.contains("# personal key"));
        assert!(text.contains("api_key = \"new-key\""));
        assert!(text.contains("model = \"gemini-2.5-flash\""));
        assert!(text.contains("prefix = \"GiaoAn\""));
    }

    #[test]
    fn numeric_keys_are_typed() {
        let text = set_value("", "generation.timeout_secs", "60").unwrap();
        assert!(text.contains("timeout_secs = 60"));
        let text = set_value(&text, "generation.temperature", "0.4").unwrap();
        let file: ConfigFile = toml::from_str(&text).unwrap();
        assert_eq!(file.generation.timeout_secs, 60);
        assert_eq!(file.generation.temperature, Some(0.4));

        assert!(set_value("", "generation.timeout_secs", "soon").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = set_value("", "generation.colour", "x").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
        assert!(set_value("", "model", "x").is_err());
    }

    #[test]
    fn run_set_writes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("lessonkit").join("config.toml");

        run_set(&path, "export.prefix", "DeThi").unwrap();
        run_set(&path, "export.output_dir", "/tmp/giao-an").unwrap();

        let file = crate::config::load_config_from(&path).unwrap();
        assert_eq!(file.export.prefix, "DeThi");
        assert_eq!(
            file.export.output_dir.as_deref(),
            Some(Path::new("/tmp/giao-an"))
        );
    }
}
