use opsassist_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AssistantError> {
    let assistant = Assistant::from_env()?;

    let snapshot = assistant
        .conversation(ConversationConfig::named("collect"))
        .turn("Create a task to rotate the staging credentials.")
        .collect_snapshot()
        .await?;

    println!("{}", snapshot.answer);
    if let Some(session_id) = snapshot.session_id {
        println!("(backend session {session_id})");
    }
    for warning in snapshot
        .guardrails
        .as_ref()
        .map(|report| report.warnings.as_slice())
        .unwrap_or_default()
    {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
