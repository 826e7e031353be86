// src/utils/progress.rs
use indicatif::{ProgressBar, ProgressStyle};

pub const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";
pub const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg} {pos}";

/// Creates a progress bar, or a spinner when `total_items` is 0 (unknown total).
pub fn create_progress_bar(total_items: u64, message: &str) -> ProgressBar {
    let (pb, template) = if total_items == 0 {
        (ProgressBar::new_spinner(), SPINNER_TEMPLATE)
    } else {
        (ProgressBar::new(total_items), BAR_TEMPLATE)
    };
    pb.set_message(message.to_string());
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
