pub mod catalog;
pub mod config;
pub mod crossing;
pub mod obstacle;
pub mod ports;
pub mod selector;
pub mod session;

pub use catalog::{CatalogError, DEFAULT_CATALOG, TrialCatalog};
pub use config::SessionSettings;
pub use crossing::CrossingTracker;
pub use obstacle::ObstacleConfigurator;
pub use ports::{DataSink, DisplayPort, Scheduler, SinkError};
pub use selector::SelectError;
pub use session::{SessionController, SessionEvent};
