use serde_json::Value;

/// Print just the headline figure from the output.
///
/// Heuristic: focus on the KPI block when present, try well-known fields in
/// priority order, then fall back to the first field.
pub fn print_minimal(value: &Value) {
    let focus = value
        .as_object()
        .and_then(|m| m.get("kpis"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "profit_total_display",
        "profit_total",
        "margin_per_unit",
        "net_margin_per_unit",
        "revenue_total_display",
        "revenue_total",
    ];

    if let Value::Object(map) = focus {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(focus));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
