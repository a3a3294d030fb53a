use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, DevelopmentContext, SubContext};
use crate::error::ShellError;
use crate::shell::CommandRunner;

const LISTENING_PORTS_COMMAND: &str = "lsof -iTCP -sTCP:LISTEN -P -n";
const DOCKER_NAMES_COMMAND: &str = "docker ps --format '{{.Names}}'";

fn localhost_port_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:localhost|127\.0\.0\.1|\[::1\]):(\d+)\b")
            .expect("localhost port pattern is valid")
    })
}

/// Local dev servers, containers and package scripts around the working directory.
pub struct DevelopmentContextProvider {
    shell: Arc<dyn CommandRunner>,
    project_dir: Option<PathBuf>,
}

impl DevelopmentContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            shell,
            project_dir: None,
        }
    }

    /// Read `package.json` from `dir` instead of the process working directory.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    async fn listening_ports(&self) -> Option<String> {
        match self.shell.execute(LISTENING_PORTS_COMMAND, None).await {
            Ok(output) => to_json(&parse_localhost_ports(&output)),
            // lsof prints nothing, and exits 1, when no socket is listening
            Err(ShellError::EmptyOutput | ShellError::ExecutionFailed(1)) => to_json::<u16>(&[]),
            Err(_) => None,
        }
    }

    async fn docker_containers(&self) -> Option<String> {
        match self.shell.execute(DOCKER_NAMES_COMMAND, None).await {
            Ok(output) => {
                let names: Vec<&str> = output
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                to_json(&names)
            }
            Err(ShellError::EmptyOutput) => to_json::<&str>(&[]),
            Err(_) => None,
        }
    }

    async fn npm_scripts(&self) -> Option<String> {
        let dir = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().ok()?,
        };
        let scripts = read_package_scripts(&dir).await?;
        to_json(&scripts)
    }
}

#[async_trait]
impl ContextProvider for DevelopmentContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Development
    }

    async fn capture(&self, _input: &ProviderInput) -> Result<SubContext> {
        let (localhost_ports, docker_containers, npm_scripts) = tokio::join!(
            self.listening_ports(),
            self.docker_containers(),
            self.npm_scripts(),
        );

        Ok(SubContext::Development(DevelopmentContext {
            localhost_ports,
            docker_containers,
            npm_scripts,
        }))
    }
}

/// Ports bound on a loopback address, deduplicated in first-seen order.
pub fn parse_localhost_ports(lsof_output: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for captures in localhost_port_pattern().captures_iter(lsof_output) {
        let Some(port) = captures.get(1).and_then(|m| m.as_str().parse::<u16>().ok()) else {
            continue;
        };
        if !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

async fn read_package_scripts(dir: &Path) -> Option<Vec<String>> {
    let raw = tokio::fs::read_to_string(dir.join("package.json")).await.ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&raw).ok()?;
    let scripts = manifest.get("scripts")?.as_object()?;
    Some(scripts.keys().cloned().collect())
}

fn to_json<T: serde::Serialize>(values: &[T]) -> Option<String> {
    serde_json::to_string(values).ok()
}
