use boxhaul_fetch::ProgressFn;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// The user-interface sink of the pipeline.
///
/// Every message passed to an implementation has already been
/// credential-scrubbed by the caller.
pub trait Ui: Send + Sync {
    fn detail(&self, message: &str);
    fn warn(&self, message: &str);
    fn ask(&self, prompt: &str) -> std::io::Result<String>;
}

/// Terminal implementation used by the CLI.
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn detail(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }

    fn ask(&self, prompt: &str) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim_end().to_string())
    }
}

/// Progress callback rendering a terminal byte bar, for wiring into
/// `DownloaderOptions`.
pub fn progress_bar() -> ProgressFn {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bytes}/{total_bytes} [{wide_bar}] {bytes_per_sec}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    Arc::new(move |downloaded, total| {
        if let Some(total) = total {
            bar.set_length(total);
            bar.set_position(downloaded);
            if downloaded >= total {
                bar.finish_and_clear();
            }
        } else {
            bar.set_position(downloaded);
        }
    })
}
