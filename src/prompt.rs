use crate::error::Result;
use dialoguer::Confirm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Push,
    SkipRepo,
    Quit,
}

/// Asks the operator whether a pending change should be pushed.
pub trait PushPrompt {
    fn confirm(&mut self, repo: &str, diff: &str) -> Result<Decision>;
}

pub struct TerminalPrompt;

impl PushPrompt for TerminalPrompt {
    fn confirm(&mut self, repo: &str, diff: &str) -> Result<Decision> {
        println!("{diff}");
        let push = Confirm::new()
            .with_prompt(format!("Push changes to {repo}?"))
            .interact()?;
        if push {
            return Ok(Decision::Push);
        }
        let quit = Confirm::new()
            .with_prompt("Quit the run? (no moves on to the next repo)")
            .default(false)
            .interact()?;
        Ok(if quit { Decision::Quit } else { Decision::SkipRepo })
    }
}
