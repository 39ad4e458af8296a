// CLI commands for the challenge catalog and submissions
use anyhow::{bail, Context, Result};
use campus_common::config::{Config, JudgeConfig};
use campus_common::redis::RedisStore;
use campus_common::store::Store;
use campus_common::types::{NewChallenge, SubmissionResult};
use campus_judge::{evaluate, Judge0Client, SubmitCode};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

async fn connect_store() -> Result<RedisStore> {
    let config = Config::from_env().context("Invalid configuration")?;
    RedisStore::connect(&config.redis_url)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.redis_url))
}

/// Clip a field for table output
fn clip(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > width {
        let mut clipped: String = line.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    } else {
        line.to_string()
    }
}

pub async fn add_challenge(
    title: String,
    description: String,
    input_format: String,
    expected_output: String,
) -> Result<()> {
    if [&title, &description, &input_format, &expected_output]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        bail!("All fields are required");
    }

    let store = connect_store().await?;

    println!("📝 Adding challenge: {}", title);
    let challenge = store
        .create_challenge(NewChallenge {
            title,
            description,
            input_format,
            expected_output,
        })
        .await
        .context("Failed to store challenge")?;

    println!("✅ Challenge {} added successfully!", challenge.id);
    println!("\n📋 Next steps:");
    println!(
        "  1. Try it: campus-cli submit --challenge {} --user <id> --file <source>",
        challenge.id
    );
    Ok(())
}

pub async fn list_challenges(json: bool) -> Result<()> {
    let store = connect_store().await?;
    let challenges = store.list_challenges().await.context("Failed to list challenges")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&challenges)?);
        return Ok(());
    }

    if challenges.is_empty() {
        println!("No challenges yet.");
        println!("\n💡 Add one with: campus-cli add-challenge --title <t> --description <d> --input-format <i> --expected-output <o>");
        return Ok(());
    }

    println!("📋 Coding Challenges:\n");
    println!("{:<6} {:<30} {:<20} {:<20}", "ID", "TITLE", "EXPECTED", "CREATED");
    println!("{}", "─".repeat(80));

    for challenge in &challenges {
        println!(
            "{:<6} {:<30} {:<20} {:<20}",
            challenge.id,
            clip(&challenge.title, 30),
            clip(&challenge.expected_output, 20),
            challenge.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    println!("\n✅ Total: {} challenge(s)", challenges.len());
    Ok(())
}

pub async fn delete_challenge(id: u64, yes: bool) -> Result<()> {
    let store = connect_store().await?;

    let challenge = match store.get_challenge(id).await? {
        Some(challenge) => challenge,
        None => bail!("Challenge {} not found", id),
    };

    if !yes {
        println!("⚠️  This will remove challenge {} ({}) and every submission made against it", id, challenge.title);
        print!("\nContinue? (y/N): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("❌ Aborted");
            return Ok(());
        }
    }

    println!("🗑️  Removing challenge {}...", id);
    if !store.delete_challenge(id).await? {
        bail!("Challenge {} was removed concurrently", id);
    }

    println!("✅ Challenge {} deleted successfully", id);
    Ok(())
}

pub async fn submit(
    file: &Path,
    challenge_id: u64,
    user_id: u64,
    language: String,
    input: String,
) -> Result<()> {
    let code = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let store = connect_store().await?;
    let judge_config = JudgeConfig::from_env().context("Invalid judge configuration")?;
    let judge = Judge0Client::new(judge_config).context("Failed to build judge HTTP client")?;

    println!("🚀 Submitting {} to challenge {}...", file.display(), challenge_id);

    let result = evaluate(
        &store,
        &judge,
        SubmitCode {
            user_id,
            challenge_id,
            code,
            input_data: input,
            language,
        },
    )
    .await?;

    print_result(&result);
    Ok(())
}

fn print_result(result: &SubmissionResult) {
    let mark = if result.is_correct { "✅" } else { "❌" };

    println!("\n{} {} (submission #{})", mark, result.status, result.submission_id);
    println!("  Correct: {}", result.is_correct);
    println!("  Time:    {}", result.execution_time);
    println!("  Memory:  {}", result.memory_used);

    if !result.output.is_empty() {
        println!("\n📤 Output:\n{}", result.output);
    }
    if let Some(compile_output) = &result.compile_output {
        println!("\n🔨 Compiler:\n{}", compile_output);
    }
    if let Some(error_output) = &result.error_output {
        println!("\n⚠️  Errors:\n{}", error_output);
    }
}

pub async fn list_submissions(user_id: u64, json: bool) -> Result<()> {
    let store = connect_store().await?;
    let submissions = store
        .list_user_submissions(user_id)
        .await
        .context("Failed to list submissions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&submissions)?);
        return Ok(());
    }

    if submissions.is_empty() {
        println!("No submissions for user {}.", user_id);
        return Ok(());
    }

    println!("📋 Submissions for user {}:\n", user_id);
    println!("{:<8} {:<10} {:<12} {:<26} {:<20}", "ID", "CHALLENGE", "LANGUAGE", "STATUS", "SUBMITTED");
    println!("{}", "─".repeat(80));

    for submission in &submissions {
        println!(
            "{:<8} {:<10} {:<12} {:<26} {:<20}",
            submission.id,
            submission.challenge_id,
            submission.language,
            clip(submission.status.label(), 26),
            submission.submitted_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    println!("\n✅ Total: {} submission(s)", submissions.len());
    Ok(())
}
