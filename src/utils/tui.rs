use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICKS: &[&str] = &["-", "\\", "|", "/"];

/// Run one spreadsheet round trip behind a spinner, clearing it afterwards.
///
/// The spinner draws on stderr and stays hidden when stderr is not a
/// terminal, so `hillfoots pull 2>log` leaves no control codes behind.
pub async fn while_syncing<F: Future>(message: impl Into<String>, task: F) -> F::Output {
    let spinner = sync_spinner(message.into(), std::io::stderr().is_terminal());
    let output = task.await;
    spinner.finish_and_clear();
    output
}

fn sync_spinner(message: String, visible: bool) -> ProgressBar {
    let target = if visible {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };

    let spinner = ProgressBar::with_draw_target(None, target);
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(TICKS)
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Host part of the Apps Script URL. The full URL carries a long deployment
/// id that would wrap the spinner line.
pub fn endpoint_label(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().filter(|host| !host.is_empty()).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_label() {
        assert_eq!(
            endpoint_label("https://script.google.com/macros/s/AKfy/exec"),
            "script.google.com"
        );
        assert_eq!(endpoint_label("http://localhost:8080/exec"), "localhost:8080");
        assert_eq!(endpoint_label(""), "");
    }

    #[test]
    fn test_hidden_spinner_keeps_message() {
        let spinner = sync_spinner("Pulling from script.google.com".into(), false);
        assert!(spinner.is_hidden());
        assert_eq!(spinner.message(), "Pulling from script.google.com");
        spinner.finish_and_clear();
        assert!(spinner.is_finished());
    }

    #[tokio::test]
    async fn test_while_syncing_returns_task_output() {
        let answer = while_syncing("Checking", async { 42 }).await;
        assert_eq!(answer, 42);
    }
}
