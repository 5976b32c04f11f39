//! Output formatting for CLI commands.

use nlq_gateway::{EnvelopeData, IntentKind, ResultEnvelope};

/// Print a result envelope as pretty JSON or as readable text.
pub fn print_envelope(envelope: &ResultEnvelope, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
        return Ok(());
    }

    println!("[{}] {}", envelope.kind, envelope.ai_message);
    if let Some(err) = &envelope.error {
        println!("Error: {}", err);
    }

    match &envelope.data {
        EnvelopeData::Message(message) => println!("{}", message),
        EnvelopeData::Rows(rows) if envelope.kind == IntentKind::Read => {
            if rows.is_empty() {
                println!("No rows returned.");
            }
            for (i, row) in rows.iter().enumerate() {
                let fields: Vec<String> = row
                    .iter()
                    .map(|(column, value)| format!("{}={}", column, value))
                    .collect();
                println!("{}. {}", i + 1, fields.join(", "));
            }
            println!("\n{} row(s)", rows.len());
        }
        EnvelopeData::Rows(_) => {}
    }
    Ok(())
}
