//! Streams a chat reply from a running chat backend.
//!
//! Run with:
//! ```bash
//! export CHAT_URL="http://localhost:8000/chat"
//! cargo run --example chat_stream -- "What is covered in lecture 3?"
//! ```

use std::io::Write;

use chatwire::{decode_response, Callbacks, ChatState, DecoderOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("CHAT_URL").unwrap_or_else(|_| "http://localhost:8000/chat".to_string());
    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Hello!".to_string());

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "message": message }))
        .send()
        .await?
        .error_for_status()?;

    let mut last_state: Option<ChatState> = None;
    let mut handler = Callbacks::new(
        |content: String, state: Option<ChatState>| {
            print!("{}", content);
            let _ = std::io::stdout().flush();
            if state.is_some() {
                last_state = state;
            }
        },
        || println!("\n\n=== Stream Complete ==="),
    );

    let summary = decode_response(response, &DecoderOptions::default(), &mut handler).await?;
    drop(handler);

    if let Some(state) = last_state {
        for source in state.sources.unwrap_or_default() {
            println!("Source: {}", source.file_name.as_deref().unwrap_or("(unknown)"));
        }
        for question in state.follow_up_questions.unwrap_or_default() {
            println!("Follow-up: {}", question);
        }
    }
    println!("Frames: {} delivered, {} rejected", summary.delivered, summary.rejected);

    Ok(())
}
