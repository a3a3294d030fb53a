use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};

use super::{ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, SubContext, TemporalContext};

pub struct TemporalContextProvider;

#[async_trait]
impl ContextProvider for TemporalContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Temporal
    }

    async fn capture(&self, _input: &ProviderInput) -> Result<SubContext> {
        Ok(SubContext::Temporal(temporal_context_at(
            Local::now().naive_local(),
        )))
    }
}

pub fn temporal_context_at(now: NaiveDateTime) -> TemporalContext {
    let time_of_day = match now.hour() {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    };

    TemporalContext {
        time_of_day: Some(time_of_day.to_string()),
        day_of_week: Some(now.format("%A").to_string()),
        calendar_event: None,
    }
}
