use opsassist_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AssistantError> {
    let assistant = Assistant::from_env()?;

    let mut turn = assistant
        .conversation(ConversationConfig::named("stream"))
        .turn("Summarize the open incidents for my tenant.")
        .strategy(Strategy::Informed)
        .start_stream()
        .await?;

    while let Some(event) = turn.next_event().await {
        match event {
            TurnEvent::Message { payload, .. } => match AgentEvent::decode(&payload) {
                Ok(AgentEvent::Answer(answer)) => println!("{}", answer.text),
                Ok(other) => println!("-- {other:?}"),
                Err(_) => {}
            },
            TurnEvent::Completed { snapshot, .. } => {
                println!("turn finished with status {:?}", snapshot.status);
            }
            TurnEvent::Error { error, .. } if error.is_cancelled() => {
                println!("turn cancelled");
            }
            TurnEvent::Error { error, .. } => eprintln!("turn error: {error}"),
            TurnEvent::TurnStarted { .. } => {}
        }
    }

    let _ = turn.finish().await?;
    Ok(())
}
