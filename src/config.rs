use std::path::PathBuf;

pub const APP_DIR: &str = "hoops_terminal";
pub const DEFAULT_TEAM: &str = "SG Arese U15";
pub const DEFAULT_DATA_FILE: &str = "players_data.csv";
const DEFAULT_LOG_LINES: usize = 200;
const MIN_LOG_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Team whose `HOME:` / `VISITORS:` block is ingested.
    pub team: String,
    pub data_file: PathBuf,
    pub export_dir: PathBuf,
    pub ingest_db: Option<PathBuf>,
    pub log_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            team: DEFAULT_TEAM.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            export_dir: PathBuf::from("."),
            ingest_db: app_cache_dir().map(|dir| dir.join("ingest_runs.sqlite")),
            log_lines: DEFAULT_LOG_LINES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            team: env_string("HOOPS_TEAM").unwrap_or(defaults.team),
            data_file: env_string("HOOPS_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            export_dir: env_string("HOOPS_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            ingest_db: env_string("HOOPS_INGEST_DB")
                .map(PathBuf::from)
                .or(defaults.ingest_db),
            log_lines: std::env::var("HOOPS_LOG_LINES")
                .ok()
                .and_then(|val| val.parse::<usize>().ok())
                .unwrap_or(defaults.log_lines)
                .max(MIN_LOG_LINES),
        }
    }
}

/// `.env.local` wins over `.env`; both are optional.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Some(base) = env_string("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env_string("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
