//! Completion backend diagnostics

use anyhow::Result;
use tally_core::{AIClient, CompletionProvider, ExpenseParser, TallyConfig};

const SAMPLE_NOTES: &[&str] = &["午餐 150", "taxi 250", "Netflix 390", "薪水 50000"];

/// Check the configured backend and parse a few notes through it
pub async fn cmd_ai_test(config: &TallyConfig, text: Option<&str>) -> Result<()> {
    println!("🔍 Testing completion backend...\n");

    let Some(client) = AIClient::from_env() else {
        println!("  ⚠️  No completion backend configured.");
        println!("\nTo enable AI parsing, set one of:");
        println!("  AI_BACKEND=openai_compatible OPENAI_COMPATIBLE_HOST=... OPENAI_COMPATIBLE_API_KEY=...");
        println!("  AI_BACKEND=ollama OLLAMA_HOST=http://localhost:11434 OLLAMA_MODEL=llama3.2");
        println!("\nWithout a backend, notes are parsed by the rule-based fallback.");
        return Ok(());
    };

    println!("  Backend: {}", client.backend_name());
    println!("  Host:    {}", client.host());
    println!("  Model:   {}\n", client.model());

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {}", client.host());
        return Ok(());
    }

    let client = client.with_timeout(config.ai.timeout);
    let parser = ExpenseParser::new(Some(client), config.ai.clone())?;
    let Some(provider) = parser.provider() else {
        return Ok(());
    };

    println!("\n📋 Parsing sample notes...\n");
    let notes: Vec<&str> = match text {
        Some(t) => vec![t],
        None => SAMPLE_NOTES.to_vec(),
    };
    for note in notes {
        print!("  \"{}\" → ", note);
        match parser.parse_with(provider, note, &[]).await {
            Ok(candidate) => println!(
                "{} {:.2} \"{}\" (confidence {})",
                candidate.category, candidate.amount, candidate.description, candidate.confidence
            ),
            Err(e) => println!("❌ Error: {}", e),
        }
    }

    Ok(())
}
