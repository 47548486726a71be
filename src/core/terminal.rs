use console::{Emoji, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_banner() {
    println!();
    println!(
        "  {}",
        style("jsreport migration · v1 → v2").bold().cyan()
    );
    println!(
        "  {}\n",
        style(format!("version {}", env!("CARGO_PKG_VERSION"))).dim()
    );
}

pub fn print_goodbye() {
    println!(
        "\n{} {}",
        SPARKLE,
        style("take your time and run the migration again when you are ready.")
            .bold()
            .cyan()
    );
}

/// A labeled progress indicator started by a [`Reporter`].
///
/// Exactly one of `stop`, `succeed`, `warn` or `fail` is expected to close it.
pub trait Progress: Send + Sync {
    /// Appends text to the current label.
    fn append(&self, text: &str);
    /// Replaces the current label.
    fn relabel(&self, text: &str);
    /// Clears the indicator without a final status line.
    fn stop(&self);
    fn succeed(&self, msg: &str);
    fn warn(&self, msg: &str);
    /// Marks the indicator failed. `None` keeps the current label as the message.
    fn fail(&self, msg: Option<&str>);
}

/// Operator-facing output port used by every migration step.
pub trait Reporter: Send + Sync {
    fn line(&self, msg: &str);
    fn blank(&self) {
        self.line("");
    }
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn fail(&self, msg: &str);
    fn progress(&self, label: &str) -> Box<dyn Progress>;
}

/// Styled stdout reporter with `indicatif` spinners.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn line(&self, msg: &str) {
        println!("{}", msg);
    }

    fn info(&self, msg: &str) {
        print_info(msg);
    }

    fn success(&self, msg: &str) {
        print_success(msg);
    }

    fn warn(&self, msg: &str) {
        print_warn(msg);
    }

    fn fail(&self, msg: &str) {
        print_error(msg);
    }

    fn progress(&self, label: &str) -> Box<dyn Progress> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Box::new(Spinner { bar })
    }
}

struct Spinner {
    bar: ProgressBar,
}

impl Progress for Spinner {
    fn append(&self, text: &str) {
        let current = self.bar.message();
        self.bar.set_message(format!("{}{}", current, text));
    }

    fn relabel(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn stop(&self) {
        self.bar.finish_and_clear();
    }

    fn succeed(&self, msg: &str) {
        self.bar.finish_and_clear();
        print_success(msg);
    }

    fn warn(&self, msg: &str) {
        self.bar.finish_and_clear();
        print_warn(msg);
    }

    fn fail(&self, msg: Option<&str>) {
        let label = self.bar.message();
        self.bar.finish_and_clear();
        print_error(msg.unwrap_or(&label));
    }
}

/// Formats names as `"a", "b"` for finding lists.
pub fn quoted_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| format!("\"{}\"", n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
