//! Embed a query and ask a grounded question.
//!
//! Run with `OPENAI_API_KEY` set:
//! `cargo run -p openai-client --example basic`

use openai_client::{ChatRequest, Message, OpenAIClient};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::from_env()?.with_timeout(Duration::from_secs(30));

    let query = "What does STEMI stand for?";
    let embedding = client.create_embedding(query, "text-embedding-ada-002").await?;
    println!("query embedded into {} dimensions", embedding.len());

    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o-mini")
                .push(Message::system(
                    "You are a hospital-based clinical decision-support assistant.",
                ))
                .push(Message::user(query))
                .with_temperature(0.2)
                .with_max_tokens(100),
        )
        .await?;

    println!("{}", response.content);
    if let Some(usage) = response.usage {
        println!("({} tokens)", usage.total_tokens);
    }

    Ok(())
}
