use regex::Regex;

/// Lists every `` `id <name>` `` occurrence as `(raw line, id)` pairs, in
/// document order. Only the plain single-command form is recognized.
pub fn collect_id_list(source: &str) -> Vec<(String, String)> {
    let regex = Regex::new(r"`id (?P<id>\w+)`").expect("id regex must compile");
    let mut result = Vec::new();
    for line in source.lines() {
        for captures in regex.captures_iter(line) {
            if let Some(id) = captures.name("id") {
                result.push((line.to_string(), id.as_str().to_string()));
            }
        }
    }
    result
}
