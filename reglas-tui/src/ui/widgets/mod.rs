//! TUI widgets for the rule screens

pub mod banner;
pub mod input;
pub mod rules_table;

pub use banner::BannerWidget;
pub use input::{InputWidget, SelectWidget};
pub use rules_table::RulesTableWidget;
