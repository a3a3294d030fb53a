//! Ambient environment metadata recorded next to a capture.
//!
//! Every field is optional. `None` means the facet was not detected; `Some("")`
//! means it was detected and is empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKind {
    Git,
    Browser,
    Ide,
    System,
    Design,
    Communication,
    Development,
    Visual,
    Temporal,
    Media,
}

impl ContextKind {
    pub const ALL: [ContextKind; 10] = [
        ContextKind::Git,
        ContextKind::Browser,
        ContextKind::Ide,
        ContextKind::System,
        ContextKind::Design,
        ContextKind::Communication,
        ContextKind::Development,
        ContextKind::Visual,
        ContextKind::Temporal,
        ContextKind::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Git => "git",
            ContextKind::Browser => "browser",
            ContextKind::Ide => "ide",
            ContextKind::System => "system",
            ContextKind::Design => "design",
            ContextKind::Communication => "communication",
            ContextKind::Development => "development",
            ContextKind::Visual => "visual",
            ContextKind::Temporal => "temporal",
            ContextKind::Media => "media",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitContext {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub remote_url: Option<String>,
    /// `"clean"` or `"dirty"`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserContext {
    pub page_title: Option<String>,
    pub domain: Option<String>,
    /// Full URL of the active tab.
    pub current_tab: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeContext {
    pub active_file: Option<String>,
    pub project_name: Option<String>,
    pub cursor_line: Option<i64>,
    pub open_files: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemContext {
    pub working_directory: Option<String>,
    /// JSON array of process names.
    pub running_processes: Option<String>,
    pub active_window_title: Option<String>,
    pub clipboard_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignContext {
    pub figma_file_id: Option<String>,
    pub figma_file_name: Option<String>,
    pub figma_frame_name: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationContext {
    pub slack_channel: Option<String>,
    pub slack_thread: Option<String>,
    pub email_subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentContext {
    /// JSON array of port numbers as strings.
    pub localhost_ports: Option<String>,
    /// JSON array of container names.
    pub docker_containers: Option<String>,
    /// JSON array of `package.json` script names.
    pub npm_scripts: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualContext {
    /// JSON array of `#rrggbb` strings, most frequent first.
    pub dominant_colors: Option<String>,
    pub detected_objects: Option<String>,
    pub text_bounds: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalContext {
    pub time_of_day: Option<String>,
    pub day_of_week: Option<String>,
    pub calendar_event: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContext {
    pub track: Option<String>,
    pub artist: Option<String>,
    pub audio_playing: Option<String>,
}

/// Output of one provider, tagged with the sub-context it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubContext {
    Git(GitContext),
    Browser(BrowserContext),
    Ide(IdeContext),
    System(SystemContext),
    Design(DesignContext),
    Communication(CommunicationContext),
    Development(DevelopmentContext),
    Visual(VisualContext),
    Temporal(TemporalContext),
    Media(MediaContext),
}

impl SubContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            SubContext::Git(_) => ContextKind::Git,
            SubContext::Browser(_) => ContextKind::Browser,
            SubContext::Ide(_) => ContextKind::Ide,
            SubContext::System(_) => ContextKind::System,
            SubContext::Design(_) => ContextKind::Design,
            SubContext::Communication(_) => ContextKind::Communication,
            SubContext::Development(_) => ContextKind::Development,
            SubContext::Visual(_) => ContextKind::Visual,
            SubContext::Temporal(_) => ContextKind::Temporal,
            SubContext::Media(_) => ContextKind::Media,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedContext {
    pub git: GitContext,
    pub browser: BrowserContext,
    pub ide: IdeContext,
    pub system: SystemContext,
    pub design: DesignContext,
    pub communication: CommunicationContext,
    pub development: DevelopmentContext,
    pub visual: VisualContext,
    pub temporal: TemporalContext,
    pub media: MediaContext,
}

impl CapturedContext {
    /// Assemble a context from provider outputs. Kinds with no output stay absent;
    /// if a kind shows up twice the later output wins.
    pub fn from_parts(parts: impl IntoIterator<Item = SubContext>) -> Self {
        let mut context = CapturedContext::default();
        for part in parts {
            match part {
                SubContext::Git(git) => context.git = git,
                SubContext::Browser(browser) => context.browser = browser,
                SubContext::Ide(ide) => context.ide = ide,
                SubContext::System(system) => context.system = system,
                SubContext::Design(design) => context.design = design,
                SubContext::Communication(communication) => {
                    context.communication = communication
                }
                SubContext::Development(development) => context.development = development,
                SubContext::Visual(visual) => context.visual = visual,
                SubContext::Temporal(temporal) => context.temporal = temporal,
                SubContext::Media(media) => context.media = media,
            }
        }
        context
    }

    /// Short one-line summary of the most useful facets, for logs.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(branch) = &self.git.branch {
            parts.push(format!("git: {branch}"));
        }
        if let Some(file) = &self.ide.active_file {
            parts.push(format!("file: {file}"));
        }
        if let Some(ports) = &self.development.localhost_ports {
            parts.push(format!("ports: {ports}"));
        }
        if let Some(track) = &self.media.track {
            parts.push(format!("playing: {track}"));
        }
        if let Some(time_of_day) = &self.temporal.time_of_day {
            parts.push(format!("time: {time_of_day}"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}
