use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg:>10} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:>10} {bytes} ({bytes_per_sec})";

/// Progress bar for a single download, drawn as one line of `multi`.
///
/// Falls back to a spinner when the server sends no content length, and to a
/// hidden bar when there is nothing to draw into.
pub fn download_bar(total: Option<u64>, label: &str, multi: Option<&MultiProgress>) -> ProgressBar {
  let Some(multi) = multi else {
    return ProgressBar::hidden();
  };

  let bar = match total {
    Some(total) => ProgressBar::new(total).with_style(
      ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░"),
    ),
    None => ProgressBar::new_spinner()
      .with_style(ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())),
  };

  let bar = multi.add(bar);
  bar.set_message(label.to_string());
  bar
}
