mod event_gate;
mod event_processor;
mod history_importer;
mod reply_renderer;
mod streak_ledger;

#[cfg(test)]
mod test_support;

pub use event_gate::{DropReason, EventGate, GateDecision};
pub use event_processor::{Clock, EventProcessor, EventReport, SystemClock};
pub use history_importer::{HistoryImporter, ImportSummary, IMPORT_PAGE_SIZE};
pub use reply_renderer::ReplyRenderer;
pub use streak_ledger::StreakLedger;
