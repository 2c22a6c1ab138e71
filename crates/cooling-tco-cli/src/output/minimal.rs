use serde_json::Value;

/// Headline figure per command, first match wins: `compare`, `sensitivity`, `pue`.
const HEADLINE_KEYS: [&str; 3] = ["npv_savings", "base_case_npv", "pue"];

/// Print the single figure a script would pipe onward.
///
/// Assumption dumps carry no headline figure and print their region codes,
/// one per line.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(value) {
        println!("{line}");
    }
}

fn minimal_lines(value: &Value) -> Vec<String> {
    let body = value.get("result").unwrap_or(value);

    let headline = HEADLINE_KEYS
        .iter()
        .find_map(|key| body.get(*key).filter(|v| !v.is_null()));
    if let Some(figure) = headline {
        return vec![scalar(figure)];
    }

    match body {
        // `assumptions --regions`
        Value::Array(rows) => rows
            .iter()
            .filter_map(|row| row.get("code"))
            .map(scalar)
            .collect(),
        Value::Object(map) => match map.get("regions").and_then(Value::as_object) {
            Some(regions) => regions.keys().cloned().collect(),
            None => vec![body.to_string()],
        },
        other => vec![scalar(other)],
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comparison_envelope_prints_npv() {
        let v = json!({
            "result": { "payback_period_years": "2.6", "npv_savings": "1072626.41" },
            "warnings": []
        });
        assert_eq!(minimal_lines(&v), vec!["1072626.41"]);
    }

    #[test]
    fn test_pue_report_prints_pue() {
        let v = json!({ "result": { "label": "Tanks", "pue": "1.0351" }, "warnings": [] });
        assert_eq!(minimal_lines(&v), vec!["1.0351"]);
    }

    #[test]
    fn test_assumption_dump_prints_region_codes() {
        let full = json!({ "regions": { "EU": {}, "US": {} }, "hours_per_year": "8760" });
        assert_eq!(minimal_lines(&full), vec!["EU", "US"]);

        let table = json!([{ "code": "CA" }, { "code": "IN" }]);
        assert_eq!(minimal_lines(&table), vec!["CA", "IN"]);
    }
}
