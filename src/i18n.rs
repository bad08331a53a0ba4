// i18n.rs
//
// Runtime string tables:
// - Strings live in either:
//   A) assets/i18n/<lang>.json
//   B) assets/i18n.json (single file, format: { "<lang>": { "key": "value" } })
// - Lookup order: selected lang -> English table compiled into the binary -> key itself
// - tr("key") / tr_with("key", [("name", "...")]) with {name} placeholders
//
// Language selection lives in config.rs (--lang / FILMPROJ_LANG).

use once_cell::sync::{Lazy, OnceCell};
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

const BUILTIN_EN: &str = include_str!("../assets/i18n/en.json");

static BUILTIN: Lazy<HashMap<String, String>> =
    Lazy::new(|| serde_json::from_str(BUILTIN_EN).unwrap_or_default());

static I18N: OnceCell<RwLock<HashMap<String, String>>> = OnceCell::new();

/// assets/i18n.json：{ "<lang>": { "key": "value" } }
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct MultiLang(HashMap<String, HashMap<String, String>>);

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let MultiLang(mut all) = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

/// Candidate asset roots: <exe_dir>/assets, then ./assets (dev working dir).
fn asset_roots() -> Vec<PathBuf> {
    let mut roots = Vec::with_capacity(2);
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            roots.push(dir.join("assets"));
        }
    }
    roots.push(PathBuf::from("assets"));
    roots
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let file = format!("{}.json", lang);
    for root in asset_roots() {
        let per_lang = root.join("i18n").join(&file);
        if let Some(m) = load_json_map(&per_lang) {
            return m;
        }
        let multi = root.join("i18n.json");
        if let Some(m) = load_multi_lang_json(&multi, lang) {
            return m;
        }
    }
    HashMap::new()
}

/// Initialize (or switch) the active language. Missing tables fall back to English.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let table = load_lang(&lang);
    log::debug!("i18n: {} ({} keys)", lang, table.len());

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = table;
        }
    } else {
        let _ = I18N.set(RwLock::new(table));
    }
}

/// Get localized text by key. If key missing everywhere, returns key itself.
pub fn tr(key: &str) -> String {
    if let Some(v) = I18N
        .get()
        .and_then(|l| l.read().ok())
        .and_then(|t| t.get(key).cloned())
    {
        return v;
    }
    BUILTIN.get(key).cloned().unwrap_or_else(|| key.to_string())
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_answers_without_init() {
        assert_eq!(tr("film.plane"), "Plane");
        assert_eq!(tr("no.such.key"), "no.such.key");
    }

    #[test]
    fn multi_lang_file_picks_one_table() {
        let dir = std::env::temp_dir().join(format!("film_projector_i18n_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("i18n.json");
        std::fs::write(&path, r#"{"en":{"a":"A"},"xx":{"a":"X"}}"#).unwrap();

        let xx = load_multi_lang_json(&path, "xx").unwrap();
        assert_eq!(xx.get("a").map(String::as_str), Some("X"));
        assert!(load_multi_lang_json(&path, "fr").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn placeholders_are_substituted() {
        let s = tr_with("log.image_loaded_size", &[("w", "4".into()), ("h", "2".into())]);
        assert!(s.contains("4x2"), "{s}");
    }
}
