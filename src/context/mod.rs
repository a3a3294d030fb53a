pub mod aggregator;
pub mod models;
pub mod providers;

pub use aggregator::ContextAggregator;
pub use models::{
    BrowserContext, CapturedContext, CommunicationContext, ContextKind, DesignContext,
    DevelopmentContext, GitContext, IdeContext, MediaContext, SubContext, SystemContext,
    TemporalContext, VisualContext,
};
pub use providers::{ContextProvider, ProviderInput};
