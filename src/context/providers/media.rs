use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{present, run_applescript, split_pair, ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, MediaContext, SubContext};
use crate::shell::CommandRunner;

const SPOTIFY_SCRIPT: &str = r#"if application "Spotify" is running then
    tell application "Spotify"
        if player state is playing then
            return {name of current track, artist of current track}
        end if
    end tell
end if"#;

const PLAYERCTL_COMMAND: &str = "playerctl metadata --format '{{title}}, {{artist}}'";

/// Now-playing track: Spotify on macOS, any MPRIS player elsewhere.
pub struct MediaContextProvider {
    shell: Arc<dyn CommandRunner>,
    scripting: bool,
}

impl MediaContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            shell,
            scripting: cfg!(target_os = "macos"),
        }
    }

    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.scripting = enabled;
        self
    }
}

#[async_trait]
impl ContextProvider for MediaContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Media
    }

    async fn capture(&self, _input: &ProviderInput) -> Result<SubContext> {
        let output = if self.scripting {
            run_applescript(self.shell.as_ref(), SPOTIFY_SCRIPT).await
        } else {
            present(self.shell.execute(PLAYERCTL_COMMAND, None).await)
        };

        Ok(SubContext::Media(
            output.as_deref().map(parse_now_playing).unwrap_or_default(),
        ))
    }
}

/// Parse `"<track>, <artist>"`.
pub fn parse_now_playing(output: &str) -> MediaContext {
    let (track, artist) = split_pair(output);
    let audio_playing = track.as_ref().map(|_| "true".to_string());
    MediaContext {
        track,
        artist,
        audio_playing,
    }
}
