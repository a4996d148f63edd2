use std::str::FromStr;

/// Source of configuration values. Production reads the process environment;
/// tests pass a closure over a fixed map.
pub(crate) trait Vars {
    fn get(&self, key: &str) -> Option<String>;

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(default)
    }

    fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
            None => default,
        }
    }
}

pub(crate) struct ProcessEnv;

impl Vars for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> Vars for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

#[cfg(test)]
pub(crate) fn fixed(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
