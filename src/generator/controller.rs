//! Prompt-and-turn controller.
//!
//! A submission appends the user's turn, picks a template from the current
//! artifact, makes one completion call, and accepts the reply only if it
//! looks like an HTML document.

use serde::Serialize;

use crate::error::GameError;
use crate::llm::{ClientCache, CompletionService};
use crate::session::{Artifact, GameSession};

use super::prompt::{Mode, build_prompt};

/// Assistant turn appended after an accepted reply.
pub const CONFIRMATION: &str = "✅ Game updated! See below 👇";

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// Template used for the call.
    pub mode: Mode,
    /// Size in bytes of the newly accepted document.
    pub artifact_len: usize,
}

/// Run one submission against `service`.
///
/// On return the session holds exactly one new user turn. The artifact and
/// the assistant turn change only when the reply contains `<html`. Prior
/// turns are never sent to the model: the improve template re-embeds the
/// whole current document instead.
pub async fn submit(
    session: &mut GameSession,
    user_text: &str,
    service: &dyn CompletionService,
) -> Result<SubmitOutcome, GameError> {
    if user_text.trim().is_empty() {
        return Err(GameError::EmptyInput);
    }

    session.add_user_turn(user_text);

    let mode = Mode::for_artifact(session.artifact());
    let prompt = build_prompt(mode, user_text, session.artifact());

    tracing::info!(
        session_id = %session.id(),
        model = %session.model(),
        mode = %mode,
        prompt_length = prompt.len(),
        "Submitting game prompt"
    );

    let reply = match service.complete(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(
                session_id = %session.id(),
                error = %e,
                "Completion call failed"
            );
            return Err(GameError::ExternalCallFailed {
                provider: service.provider_name().to_string(),
                detail: e.to_string(),
            });
        }
    };

    let Some(artifact) = Artifact::accept(reply.trim()) else {
        tracing::warn!(
            session_id = %session.id(),
            reply_length = reply.len(),
            "Reply rejected: no <html marker"
        );
        return Err(GameError::InvalidResponse);
    };

    let outcome = SubmitOutcome {
        mode,
        artifact_len: artifact.len(),
    };
    session.replace_artifact(artifact);
    session.add_assistant_turn(CONFIRMATION);

    tracing::info!(
        session_id = %session.id(),
        mode = %mode,
        artifact_length = outcome.artifact_len,
        "Game updated"
    );

    Ok(outcome)
}

/// Controller bound to the process-wide client cache.
#[derive(Debug, Clone)]
pub struct Generator {
    clients: ClientCache,
}

impl Generator {
    #[must_use]
    pub fn new(clients: ClientCache) -> Self {
        Self { clients }
    }

    /// Submit using the client for the session's selected model.
    pub async fn submit(
        &self,
        session: &mut GameSession,
        user_text: &str,
    ) -> Result<SubmitOutcome, GameError> {
        let client = self.clients.client_for(session.model());
        submit(session, user_text, client.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::ApiKey;
    use crate::llm::{ClientFactory, CompletionError, LlmSettings};
    use crate::session::Role;

    /// Replays scripted replies and records every prompt it receives.
    #[derive(Default)]
    struct MockService {
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockService {
        fn replying(replies: impl IntoIterator<Item = Result<&'static str, &'static str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                prompts: Mutex::default(),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for MockService {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(CompletionError::Api {
                    status: 503,
                    message,
                }),
                None => Err(CompletionError::MalformedResponse("no reply scripted".to_string())),
            }
        }

        fn provider_name(&self) -> &str {
            "Mock"
        }
    }

    const IDEA: &str = "a platformer where a cat jumps over lava";
    const GAME_V1: &str = "<html><body><canvas></canvas>v1</body></html>";
    const GAME_V2: &str = "<!DOCTYPE html><HTML><body>v2</body></HTML>";

    fn assistant_turns(session: &GameSession) -> usize {
        session
            .turns()
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .count()
    }

    #[tokio::test]
    async fn test_invalid_reply_leaves_artifact_empty() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok("Sure! Here is your game: ...")]);

        let err = submit(&mut session, IDEA, &service).await.unwrap_err();

        assert!(matches!(err, GameError::InvalidResponse));
        assert!(session.artifact().is_empty());
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::User);
        assert_eq!(session.turns()[0].content, IDEA);

        let prompts = service.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&format!("Game idea: {IDEA}")));
    }

    #[tokio::test]
    async fn test_valid_reply_creates_artifact() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok("\n\n  <html>...</html>  \n")]);

        let outcome = submit(&mut session, IDEA, &service).await.unwrap();

        assert_eq!(outcome.mode, Mode::Create);
        assert_eq!(session.artifact().as_str(), "<html>...</html>");
        assert_eq!(outcome.artifact_len, "<html>...</html>".len());
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.turns()[1].role, Role::Assistant);
        assert_eq!(session.turns()[1].content, CONFIRMATION);
    }

    #[tokio::test]
    async fn test_improve_embeds_request_and_prior_game() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok(GAME_V1), Ok(GAME_V2)]);

        submit(&mut session, IDEA, &service).await.unwrap();
        let outcome = submit(&mut session, "make the cat jump higher", &service)
            .await
            .unwrap();

        assert_eq!(outcome.mode, Mode::Improve);
        assert_eq!(session.artifact().as_str(), GAME_V2);

        let prompts = service.prompts();
        assert!(prompts[1].contains("Request: \"make the cat jump higher\""));
        assert!(prompts[1].contains(GAME_V1));
        // stateless: earlier turns are not replayed to the model
        assert!(!prompts[1].contains(IDEA));
        assert_eq!(assistant_turns(&session), 2);
    }

    #[tokio::test]
    async fn test_transport_error_leaves_state_unchanged() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok(GAME_V1), Err("connection reset by peer")]);
        submit(&mut session, IDEA, &service).await.unwrap();

        let err = submit(&mut session, "add a score counter", &service)
            .await
            .unwrap_err();

        match err {
            GameError::ExternalCallFailed { provider, detail } => {
                assert_eq!(provider, "Mock");
                assert!(detail.contains("connection reset by peer"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.artifact().as_str(), GAME_V1);
        assert_eq!(assistant_turns(&session), 1);
        assert_eq!(session.turns().len(), 3);
        assert_eq!(session.turns()[2].content, "add a score counter");
    }

    #[tokio::test]
    async fn test_invalid_improve_keeps_previous_game() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok(GAME_V1), Ok("```js\nconsole.log(1)\n```")]);
        submit(&mut session, IDEA, &service).await.unwrap();

        let err = submit(&mut session, "rewrite in js", &service).await.unwrap_err();

        assert!(matches!(err, GameError::InvalidResponse));
        assert_eq!(session.artifact().as_str(), GAME_V1);
        assert_eq!(assistant_turns(&session), 1);
    }

    #[tokio::test]
    async fn test_resubmission_reuses_mode() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok("no markup"), Ok("still no markup")]);

        let _ = submit(&mut session, IDEA, &service).await;
        let _ = submit(&mut session, IDEA, &service).await;

        let prompts = service.prompts();
        assert_eq!(prompts[0], prompts[1]);
        assert_eq!(session.turns().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_without_turn() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::default();

        let err = submit(&mut session, "   \n", &service).await.unwrap_err();

        assert!(matches!(err, GameError::EmptyInput));
        assert!(session.turns().is_empty());
        assert!(service.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_single_character_with_padding_is_accepted() {
        let mut session = GameSession::new("s1", "qwen");
        let service = MockService::replying([Ok(GAME_V1)]);

        let outcome = submit(&mut session, " \t x \n", &service).await.unwrap();

        assert_eq!(outcome.mode, Mode::Create);
        // stored verbatim; only the emptiness check trims
        assert_eq!(session.turns()[0].content, " \t x \n");
        assert!(service.prompts()[0].contains(" \t x \n"));
        assert_eq!(session.artifact().as_str(), GAME_V1);
    }

    #[tokio::test]
    async fn test_generator_uses_session_model() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_factory = Arc::clone(&seen);
        let factory: ClientFactory = Arc::new(move |settings: &LlmSettings| {
            seen_by_factory.lock().unwrap().push(settings.model.clone());
            Arc::new(MockService::replying([Ok(GAME_V1)])) as Arc<dyn CompletionService>
        });
        let generator = Generator::new(ClientCache::with_factory(
            "https://api.cerebras.ai/v1",
            ApiKey::new("csk-test").unwrap(),
            factory,
        ));

        let mut session = GameSession::new("s1", "llama-4-scout-17b-16e-instruct");
        generator.submit(&mut session, IDEA).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["llama-4-scout-17b-16e-instruct"]);
        assert!(session.artifact().is_valid());
    }
}
