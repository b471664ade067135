//! Text and JSON presentation of a device report.

use console::style;
use droidinfo::{Category, DeviceReport, FIELDS, UNKNOWN};
use serde_json::{Map, Value, json};

const LABEL_WIDTH: usize = 20;
const GAUGE_CELLS: usize = 20;

/// Render the report grouped by category, one `label value` row per field.
pub(crate) fn render_report(report: &DeviceReport) -> String {
    let mut out = String::new();

    for (index, (category, rows)) in report
        .sections()
        .into_iter()
        .enumerate()
    {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\n",
            style(category.title())
                .cyan()
                .bold()
                .underlined()
        ));
        for (field, value) in rows {
            let value = styled_value(field.key, value);
            let value = if field.key == "battery_percentage" {
                match report.battery_percentage() {
                    Some(pct) => format!("{value}  {}", gauge(pct)),
                    None => value,
                }
            } else {
                value
            };
            out.push_str(&format!(
                "  {:<width$} {value}\n",
                field.label,
                width = LABEL_WIDTH
            ));
        }
    }

    out
}

fn styled_value(key: &str, value: &str) -> String {
    if value == UNKNOWN {
        return style(value)
            .dim()
            .to_string();
    }
    match (key, value) {
        ("root_status", "Rooted") => style(value)
            .red()
            .bold()
            .to_string(),
        ("root_status", _) => style(value)
            .green()
            .to_string(),
        ("battery_health", "Good") => style(value)
            .green()
            .to_string(),
        ("battery_health", _) => style(value)
            .yellow()
            .to_string(),
        _ => value.to_string(),
    }
}

/// `[██████████░░░░░░░░░░]`, coloured by charge.
pub(crate) fn gauge(percentage: f64) -> String {
    let pct = percentage.clamp(0.0, 100.0);
    let filled = ((pct / 100.0) * GAUGE_CELLS as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(GAUGE_CELLS - filled)
    );
    let bar = if pct >= 50.0 {
        style(bar).green()
    } else if pct >= 20.0 {
        style(bar).yellow()
    } else {
        style(bar).red()
    };
    format!("[{bar}]")
}

/// Report fields as `{category: {key: value}}` plus the device entry.
pub(crate) fn report_json(report: &DeviceReport) -> Value {
    let mut data = Map::new();
    data.insert(
        "device".to_string(),
        serde_json::to_value(&report.device).unwrap_or(Value::Null),
    );

    for category in Category::ALL {
        let fields: Map<String, Value> = FIELDS
            .iter()
            .filter(|f| f.category == category)
            .map(|f| (f.key.to_string(), Value::from(report.get(f.key))))
            .collect();
        data.insert(category.key().to_string(), Value::Object(fields));
    }

    if let Some(battery) = report.battery() {
        data.insert(
            "battery_raw".to_string(),
            serde_json::to_value(battery).unwrap_or(Value::Null),
        );
    }

    Value::Object(data)
}

/// Standard success envelope.
pub(crate) fn ok_envelope(data: Value) -> Value {
    json!({
        "ok": true,
        "data": data,
    })
}

/// `device_info_<model>.json`, falling back to the serial for unknown models.
pub(crate) fn default_file_name(report: &DeviceReport) -> String {
    let base = match report.value("model") {
        Some(model) => model,
        None => report.device.serial.as_str(),
    };
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("device_info_{safe}.json")
}
