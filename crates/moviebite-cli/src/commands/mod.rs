pub mod clear;
pub mod config;
pub mod history;
pub mod play;
pub mod resume;
pub mod transfer;
pub mod watch_later;

use comfy_table::{Cell, Table};
use moviebite_core::{FileStorage, PersonalizationStore};

pub type Store = PersonalizationStore<FileStorage>;

/// Rounded UTF-8 table with a bold header row
pub fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    let header: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).add_attribute(comfy_table::Attribute::Bold))
        .collect();
    table.set_header(header);
    table
}
