//! Prompt templates.
//!
//! The template depends only on the current artifact: no valid document yet
//! means [`Mode::Create`], otherwise [`Mode::Improve`]. User text and the
//! current document are embedded verbatim.

use std::fmt;

use serde::Serialize;

use crate::session::Artifact;

/// Which template a submission uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Generate a new game from an idea.
    Create,
    /// Revise the existing game.
    Improve,
}

impl Mode {
    /// Select the template for the session's current artifact.
    #[must_use]
    pub fn for_artifact(artifact: &Artifact) -> Self {
        if artifact.is_valid() {
            Self::Improve
        } else {
            Self::Create
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Improve => f.write_str("improve"),
        }
    }
}

/// Build the full prompt text for `mode`.
#[must_use]
pub fn build_prompt(mode: Mode, user_text: &str, artifact: &Artifact) -> String {
    match mode {
        Mode::Create => create_prompt(user_text),
        Mode::Improve => improve_prompt(user_text, artifact.as_str()),
    }
}

fn create_prompt(game_idea: &str) -> String {
    format!(
        "You're an expert HTML5 game developer.

Generate a visually appealing and playable HTML5 game based on the following idea.
Requirements:
- Canvas-based game
- Retry button after losing
- Entire game in one standalone HTML file
- NO markdown (no triple backticks)

Game idea: {game_idea}
"
    )
}

fn improve_prompt(request: &str, game_code: &str) -> String {
    format!(
        "Improve the following HTML5 game based on the user request.

Request: \"{request}\"

Only return a full, standalone HTML file (no explanations or markdown).

Game code:
{game_code}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_artifact_selects_create() {
        assert_eq!(Mode::for_artifact(&Artifact::empty()), Mode::Create);
    }

    #[test]
    fn test_valid_artifact_selects_improve() {
        let artifact = Artifact::accept("<HTML><body></body></HTML>").unwrap();
        assert_eq!(Mode::for_artifact(&artifact), Mode::Improve);
    }

    #[test]
    fn test_create_prompt_embeds_idea() {
        let prompt = build_prompt(
            Mode::Create,
            "a platformer where a cat jumps over lava",
            &Artifact::empty(),
        );
        assert!(prompt.starts_with("You're an expert HTML5 game developer."));
        assert!(prompt.contains("- Canvas-based game"));
        assert!(prompt.contains("- Retry button after losing"));
        assert!(prompt.contains("- NO markdown (no triple backticks)"));
        assert!(prompt.contains("Game idea: a platformer where a cat jumps over lava\n"));
    }

    #[test]
    fn test_improve_prompt_embeds_request_and_code() {
        let code = "<html>\n<canvas id=\"c\"></canvas>\n</html>";
        let artifact = Artifact::accept(code).unwrap();
        let prompt = build_prompt(Mode::Improve, "make the cat jump higher", &artifact);

        assert!(prompt.starts_with("Improve the following HTML5 game"));
        assert!(prompt.contains("Request: \"make the cat jump higher\""));
        assert!(prompt.contains("no explanations or markdown"));
        assert!(prompt.contains(&format!("Game code:\n{code}\n")));
    }

    #[test]
    fn test_braces_in_user_text_are_literal() {
        let prompt = build_prompt(Mode::Create, "score = {lives} * 10", &Artifact::empty());
        assert!(prompt.contains("Game idea: score = {lives} * 10"));
    }
}
