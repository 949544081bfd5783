//! Environment entry parsing.

use std::collections::BTreeMap;

/// Parse `KEY=VALUE` entries into a mapping.
///
/// The key ends at the first `=` after the first character, so values may
/// themselves contain `=` and Windows drive variables (`=C:=C:\`) keep their
/// leading `=`. An entry without a separator maps to an empty value. Later
/// entries win over earlier ones with the same key.
pub fn parse_env<I, S>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = BTreeMap::new();
    for entry in entries {
        let (key, value) = split_entry(entry.as_ref());
        parsed.insert(key.to_string(), value.to_string());
    }
    parsed
}

fn split_entry(entry: &str) -> (&str, &str) {
    let search_from = entry.chars().next().map_or(0, char::len_utf8);
    match entry[search_from..].find('=') {
        Some(offset) => {
            let split = search_from + offset;
            (&entry[..split], &entry[split + 1..])
        }
        None => (entry, ""),
    }
}
