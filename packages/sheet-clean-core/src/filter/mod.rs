//! Deterministic natural-language row filtering.

mod chip;
mod field_resolver;
mod presets;
mod text_filter;

pub use chip::{apply_chips, remove_chip, ChipKind, FilterChip};
pub use field_resolver::find_matching_field;
pub use presets::{presets, QuickFilter};
pub use text_filter::{apply_text_filter, TextQuery};
