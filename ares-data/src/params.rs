use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Prefix of every generated parameter name.
pub const PARAM_PREFIX: &str = ":arp";

/// Monotonic source of unique parameter names.
///
/// Rehydrated criteria draw fresh names from a sequence so that two criteria
/// persisted separately never collide once merged. Tests create their own
/// sequence; serde's `Deserialize` goes through [`ParamSequence::global`].
#[derive(Debug, Default)]
pub struct ParamSequence {
    next: AtomicU64,
}

impl ParamSequence {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide sequence.
    pub fn global() -> &'static ParamSequence {
        static GLOBAL: OnceLock<ParamSequence> = OnceLock::new();
        GLOBAL.get_or_init(ParamSequence::new)
    }

    /// Take the next name, e.g. `:arp0`, `:arp1`, ...
    pub fn next_name(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{PARAM_PREFIX}{n}")
    }

    /// Number of names handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

/// Replace every occurrence of the map's keys in `input` with their values.
///
/// At each position the longest matching key wins and replaced text is never
/// scanned again, so `:p1` cannot clobber the prefix of `:p10`.
pub fn translate(input: &str, map: &BTreeMap<String, String>) -> String {
    if map.is_empty() || input.is_empty() {
        return input.to_string();
    }
    let mut keys: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    'scan: while !rest.is_empty() {
        for key in &keys {
            if rest.starts_with(key) {
                out.push_str(&map[*key]);
                rest = &rest[key.len()..];
                continue 'scan;
            }
        }
        let ch = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&rest[..ch]);
        rest = &rest[ch..];
    }
    out
}
