//! Server-side rendered page.
//!
//! A single page shows the model selector, the conversation, the input form,
//! an error banner, and (once a game exists) the embedded viewer with a
//! download link. Templates are auto-escaped HTML, so user text and model
//! output never reach the page as markup; the game itself is served from its
//! own route and loaded into the viewer iframe.

use minijinja::Environment;
use serde::Serialize;

use crate::config::AppConfig;
use crate::session::{GameSession, Role};

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// Page title shown in the header and the browser tab.
pub const PAGE_TITLE: &str = "🎮 World's Fastest Game Generator";

/// Conversation turn as shown on the page.
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub content: String,
}

/// Everything the page template needs.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: &'static str,
    /// Shown instead of the whole interactive page when set.
    pub config_error: Option<String>,
    pub session_id: Option<String>,
    pub turns: Vec<TurnView>,
    pub error: Option<String>,
    pub models: Vec<String>,
    pub selected_model: String,
    pub provider: String,
    pub has_game: bool,
    pub game_url: String,
    pub download_url: String,
    pub download_file_name: String,
    pub viewer_height: u32,
}

impl PageView {
    /// Page for a configured app and a live session.
    #[must_use]
    pub fn for_session(
        config: &AppConfig,
        provider: &str,
        session: &GameSession,
        error: Option<String>,
    ) -> Self {
        let id = session.id();
        Self {
            title: PAGE_TITLE,
            config_error: None,
            session_id: Some(id.to_string()),
            turns: session
                .turns()
                .iter()
                .map(|t| TurnView {
                    role: t.role,
                    content: t.content.clone(),
                })
                .collect(),
            error,
            models: config.llm.models.clone(),
            selected_model: session.model().to_string(),
            provider: provider.to_string(),
            has_game: session.artifact().is_valid(),
            game_url: format!("/sessions/{id}/game"),
            download_url: format!("/sessions/{id}/game/download"),
            download_file_name: config.game.download_file_name.clone(),
            viewer_height: config.game.viewer_height,
        }
    }

    /// Page before the first submission; the form carries no session id.
    #[must_use]
    pub fn without_session(config: &AppConfig, provider: &str, error: Option<String>) -> Self {
        Self {
            title: PAGE_TITLE,
            config_error: None,
            session_id: None,
            turns: Vec::new(),
            error,
            models: config.llm.models.clone(),
            selected_model: config.llm.model.clone(),
            provider: provider.to_string(),
            has_game: false,
            game_url: String::new(),
            download_url: String::new(),
            download_file_name: config.game.download_file_name.clone(),
            viewer_height: config.game.viewer_height,
        }
    }

    /// Page shown when no API key is configured.
    #[must_use]
    pub fn config_missing(config: &AppConfig, provider: &str, message: String) -> Self {
        Self {
            title: PAGE_TITLE,
            config_error: Some(message),
            session_id: None,
            turns: Vec::new(),
            error: None,
            models: config.llm.models.clone(),
            selected_model: config.llm.model.clone(),
            provider: provider.to_string(),
            has_game: false,
            game_url: String::new(),
            download_url: String::new(),
            download_file_name: config.game.download_file_name.clone(),
            viewer_height: config.game.viewer_height,
        }
    }
}

/// Compiled page templates.
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Artifact;

    fn test_config() -> AppConfig {
        AppConfig::load_from_args(["game-forge"]).unwrap()
    }

    #[test]
    fn test_turn_content_is_escaped() {
        let config = test_config();
        let mut session = GameSession::new("s1", &config.llm.model);
        session.add_user_turn("<script>alert('x')</script> pong");

        let html = PageRenderer::new()
            .unwrap()
            .render(&PageView::for_session(&config, "Cerebras", &session, None))
            .unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Describe your game or suggest an improvement..."));
    }

    #[test]
    fn test_viewer_only_with_game() {
        let config = test_config();
        let renderer = PageRenderer::new().unwrap();
        let mut session = GameSession::new("s1", &config.llm.model);

        let html = renderer
            .render(&PageView::for_session(&config, "Cerebras", &session, None))
            .unwrap();
        assert!(!html.contains("<iframe"));

        session.replace_artifact(Artifact::accept("<html>game</html>").unwrap());
        let html = renderer
            .render(&PageView::for_session(&config, "Cerebras", &session, None))
            .unwrap();
        assert!(html.contains(r#"src="/sessions/s1/game""#));
        assert!(html.contains(r#"height="600""#));
        assert!(html.contains(r#"scrolling="no""#));
        assert!(html.contains("/sessions/s1/game/download"));
    }

    #[test]
    fn test_page_without_session_omits_session_field() {
        let config = test_config();
        let html = PageRenderer::new()
            .unwrap()
            .render(&PageView::without_session(&config, "Cerebras", None))
            .unwrap();

        assert!(html.contains("<form"));
        assert!(!html.contains(r#"name="session_id""#));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn test_config_missing_hides_form() {
        let config = test_config();
        let html = PageRenderer::new()
            .unwrap()
            .render(&PageView::config_missing(
                &config,
                "Cerebras",
                "API key not found".to_string(),
            ))
            .unwrap();

        assert!(html.contains("API key not found"));
        assert!(!html.contains("<form"));
    }
}
