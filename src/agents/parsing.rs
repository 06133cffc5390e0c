/// Extract the first complete JSON object from a model completion.
///
/// Completions arrive with assorted wrappers depending on the model:
/// markdown code fences, `<think>` blocks, or trailing prose. Strip the
/// wrappers, then take the first brace-balanced object.
pub(crate) fn extract_json_object(input: &str) -> Option<String> {
    let mut cleaned = input.to_string();

    while let Some(open) = cleaned.find("<think>") {
        match cleaned[open..].find("</think>") {
            Some(close) => {
                let end = open + close + "</think>".len();
                cleaned.replace_range(open..end, "");
            }
            None => {
                // Unclosed tag: everything after it is reasoning, not output.
                cleaned.replace_range(open.., "");
                break;
            }
        }
    }

    let cleaned = cleaned.replace("```json", "").replace("```", "");

    let trimmed = cleaned.trim();
    let start = trimmed.find('{')?;

    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in trimmed[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(trimmed[start..=start + idx].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
