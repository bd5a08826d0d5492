use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a raw JSON value
pub fn output_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a list of members as a table or JSON array
pub fn output_members(output_format: &OutputFormat, members: &Value, empty_message: &str) -> anyhow::Result<()> {
    let rows = members.as_array().cloned().unwrap_or_default();

    match output_format {
        OutputFormat::Json => output_json(&json!({ "members": rows })),
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("{}", empty_message);
                return Ok(());
            }

            println!("{:<37} {:<28} {:<24} {:<20} {}", "ID", "NAME", "ROLE", "TERRITORY", "ACTIVE");
            println!("{}", "-".repeat(118));
            for member in &rows {
                println!(
                    "{:<37} {:<28} {:<24} {:<20} {}",
                    field(member, "id"),
                    field(member, "name"),
                    field(member, "role"),
                    territory(member),
                    member.get("is_active").and_then(Value::as_bool).unwrap_or(false)
                );
            }
            Ok(())
        }
    }
}

/// Output a single member as key/value lines or JSON
pub fn output_member(output_format: &OutputFormat, member: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(member),
        OutputFormat::Text => {
            for key in ["id", "name", "email", "role", "hierarchy_level", "reports_to", "is_active"] {
                println!("{:<16} {}", format!("{}:", key), field(member, key));
            }
            println!("{:<16} {}", "territory:", territory(member));
            Ok(())
        }
    }
}

/// Unwrap the `data` field of an API envelope
pub fn envelope_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Object(map)),
        other => other,
    }
}

fn field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn territory(member: &Value) -> String {
    match (member.get("municipality").and_then(Value::as_str), member.get("zone").and_then(Value::as_str)) {
        (Some(municipality), Some(zone)) => format!("{} ({})", municipality, zone),
        (None, Some(zone)) => zone.to_string(),
        (Some(municipality), None) => municipality.to_string(),
        (None, None) => "-".to_string(),
    }
}
