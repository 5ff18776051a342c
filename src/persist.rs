use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::app_cache_dir;
use crate::view::FilterSelection;

const SESSION_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionFile {
    version: u32,
    #[serde(default)]
    data_file: Option<String>,
    #[serde(default)]
    selection: FilterSelection,
}

/// Last filter selection saved for `data_file`, if any.
pub fn load_selection(data_file: &Path) -> Option<FilterSelection> {
    load_selection_from(&session_path()?, data_file)
}

pub fn save_selection(data_file: &Path, selection: &FilterSelection) {
    let Some(path) = session_path() else {
        return;
    };
    save_selection_to(&path, data_file, selection);
}

pub fn load_selection_from(path: &Path, data_file: &Path) -> Option<FilterSelection> {
    let raw = fs::read_to_string(path).ok()?;
    let session = serde_json::from_str::<SessionFile>(&raw).ok()?;
    if session.version != SESSION_VERSION {
        return None;
    }
    // A session belongs to one dataset file.
    if session.data_file.as_deref() != Some(data_file_key(data_file).as_str()) {
        return None;
    }
    Some(session.selection)
}

pub fn save_selection_to(path: &Path, data_file: &Path, selection: &FilterSelection) {
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let session = SessionFile {
        version: SESSION_VERSION,
        data_file: Some(data_file_key(data_file)),
        selection: selection.clone(),
    };
    if let Ok(json) = serde_json::to_string(&session) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, path);
        }
    }
}

fn data_file_key(data_file: &Path) -> String {
    fs::canonicalize(data_file)
        .unwrap_or_else(|_| data_file.to_path_buf())
        .display()
        .to_string()
}

fn session_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SESSION_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Selection;

    #[test]
    fn selection_round_trips_for_same_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let data = dir.path().join("players_data.csv");
        let other = dir.path().join("other.csv");

        let selection = FilterSelection {
            matches: Selection::only(["Arese - Rho"]),
            players: Selection::all(),
        };
        save_selection_to(&session, &data, &selection);

        assert_eq!(load_selection_from(&session, &data), Some(selection));
        assert_eq!(load_selection_from(&session, &other), None);
    }
}
