mod format;
mod natural;
mod path;

pub use format::{format_count, format_timestamp, unix_now};
pub use natural::{natural_cmp, natural_sort};
pub use path::{is_folder_entry, split_at_root, split_segments, with_trailing_separator, SEPARATOR};
