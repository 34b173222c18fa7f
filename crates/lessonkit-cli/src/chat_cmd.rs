//! `lessonkit chat`: one turn with the assistant.

use anyhow::{Result, bail};
use tracing::warn;

use lessonkit_core::chat::{ChatLog, ask};
use lessonkit_core::generation::GenerationService;

pub async fn run_chat(service: &dyn GenerationService, message: &str) -> Result<()> {
    let mut log = ChatLog::new();
    let Some(reply) = ask(service, &mut log, message).await else {
        bail!("message is empty");
    };
    if reply.fallback {
        warn!("chat assistant unavailable; showing fallback reply");
    }
    println!("{}", reply.text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use lessonkit_test_utils::ScriptedGenerator;

    use super::*;

    #[tokio::test]
    async fn blank_message_is_an_error() {
        let service = ScriptedGenerator::new();
        assert!(run_chat(&service, "  ").await.is_err());
        assert!(service.prompts().is_empty());
    }

    #[tokio::test]
    async fn message_is_sent_with_persona() {
        let service = ScriptedGenerator::new().reply("Chào thầy cô!");
        run_chat(&service, "Xin chào").await.unwrap();
        let sent = &service.prompts()[0];
        assert!(sent.starts_with(lessonkit_core::chat::CHAT_WRAPPER));
        assert!(sent.ends_with("Xin chào"));
    }
}
