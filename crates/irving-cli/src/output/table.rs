use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format a report as tables: KPI block first, then products, then the
/// daily series. Other payloads fall back to generic rendering.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) if map.contains_key("kpis") => print_report(map),
        Value::Object(_) => print_flat_object(value),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_report(map: &serde_json::Map<String, Value>) {
    if let Some(kpis) = map.get("kpis") {
        print_flat_object(kpis);
    }

    if let Some(Value::Array(products)) = map.get("products") {
        if !products.is_empty() {
            println!("\nProducts:");
            print_array_table(products);
        }
    }

    if let Some(Value::Array(series)) = map.get("daily_series") {
        if !series.is_empty() {
            println!("\nDaily series:");
            print_array_table(series);
        }
    }

    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if arr.iter().any(|item| item.is_object()) {
        // Headers are the union over all rows; optional fields like
        // unit_cost may be absent from the first row but present later.
        let headers = collect_headers(arr);
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn collect_headers(arr: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for item in arr {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
