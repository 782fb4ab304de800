mod history;
mod hub;
mod reconciler;

pub use history::{History, HistoryPoint};
pub use hub::{HubSettings, LiveHub};
pub use reconciler::{LiveView, Reconciler};
