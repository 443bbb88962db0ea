use std::env;

pub fn key_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(val) => val,
        Err(_) => default.into(),
    }
}

pub fn key_or_none(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(val) => Some(val),
        Err(_) => None,
    }
}

/// input: string. file to read, "-" for stdin
/// output: string. .npy file to create
/// dtype: string. numpy type string of each value in scalar mode, e.g. f8
/// delimiter: char. column separator, whitespace if unset
/// labels: list of strings. switches to record mode, one f8 field per label
/// log_file: string. optional file to mirror log output to
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub input: String,
    pub output: String,
    pub dtype: String,
    pub delimiter: Option<char>,
    pub labels: Vec<String>,
    pub verbosity: u8,
    pub log_file: Option<String>,
}
