use std::io::{stderr, stdout, Write};
use std::sync::OnceLock;

use humantime::format_rfc3339;
use serde_json::{Map, Value};

const LEVEL_ENV: &str = "JSON_PARAM_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    pub fn parse(raw: &str) -> Option<LogLevel> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "fatal" => Some(LogLevel::Fatal),
            _ => None,
        }
    }
}

fn min_level() -> LogLevel {
    static MIN_LEVEL: OnceLock<LogLevel> = OnceLock::new();
    *MIN_LEVEL.get_or_init(|| {
        std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|raw| LogLevel::parse(&raw))
            .unwrap_or(LogLevel::Info)
    })
}

fn current_timestamp() -> String {
    format_rfc3339(std::time::SystemTime::now()).to_string()
}

// Only scalar tag values survive; nested structures belong in `data`.
fn stable_tags(value: Option<Value>) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(Value::Object(obj)) = value {
        for (key, val) in obj {
            match val {
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    out.insert(key, val);
                }
                _ => {}
            }
        }
    }
    out
}

pub fn build_entry(
    level: LogLevel,
    message: &str,
    data: Option<Value>,
    tags: Option<Value>,
) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
    entry.insert("message".to_string(), Value::String(message.to_string()));
    if let Some(data @ Value::Object(_)) = data {
        entry.insert("data".to_string(), data);
    }

    let mut merged = Map::new();
    merged.insert(
        "component".to_string(),
        Value::String("json-param".to_string()),
    );
    merged.extend(stable_tags(tags));
    entry.insert("tags".to_string(), Value::Object(merged));
    entry.insert("timestamp".to_string(), Value::String(current_timestamp()));
    entry
}

fn write_entry(level: LogLevel, entry: &Map<String, Value>) {
    if let Ok(serialized) = serde_json::to_string(entry) {
        if level >= LogLevel::Error {
            let _ = writeln!(stderr(), "{}", serialized);
        } else {
            let _ = writeln!(stdout(), "{}", serialized);
        }
    }
}

pub fn log(level: LogLevel, message: &str, data: Option<Value>, tags: Option<Value>) {
    if level < min_level() {
        return;
    }
    let entry = build_entry(level, message, data, tags);
    write_entry(level, &entry);
}

pub fn log_debug(message: &str, data: Option<Value>, tags: Option<Value>) {
    log(LogLevel::Debug, message, data, tags);
}

pub fn log_info(message: &str, data: Option<Value>, tags: Option<Value>) {
    log(LogLevel::Info, message, data, tags);
}

pub fn log_warn(message: &str, data: Option<Value>, tags: Option<Value>) {
    log(LogLevel::Warn, message, data, tags);
}

pub fn log_error(message: &str, data: Option<Value>, tags: Option<Value>) {
    log(LogLevel::Error, message, data, tags);
}
