pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    answer_block, dim, error, header, muted, progress_bar, question_card, rating_line,
    section, status, success, summary_row, warn,
};
pub use table::{TableBuilder, histogram_table};
pub use theme::{Theme, theme};
