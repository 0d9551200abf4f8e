//! Read-eval loop over the line protocol
//!
//! Reads commands until a line equal to `end` or end of input. A failing
//! line is reported and the loop moves on to the next one.

use std::io::BufRead;

use anyhow::{Context, Result};

use super::output::Output;
use super::router::CommandRouter;

/// Line that terminates the loop
pub const END_MARKER: &str = "end";

/// Counts from one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplSummary {
    pub dispatched: usize,
    pub failed: usize,
}

/// Runs the loop over `input`, dispatching each line to `router`
///
/// A line that is not valid UTF-8 counts as a failed command. Only an I/O
/// error on the input itself ends the loop early.
pub fn run<R: BufRead>(
    router: &mut CommandRouter,
    mut input: R,
    output: &Output,
) -> Result<ReplSummary> {
    let mut summary = ReplSummary::default();
    let mut buf = Vec::new();
    let mut number = 0;

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read input line {}", number + 1))?;
        if read == 0 {
            break;
        }
        number += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                summary.dispatched += 1;
                summary.failed += 1;
                output.error(&format!("line {}: invalid UTF-8: {}", number, e));
                continue;
            }
        };

        if line == END_MARKER {
            output.verbose_ctx("repl", "end of commands");
            break;
        }
        if line.is_empty() {
            continue;
        }

        summary.dispatched += 1;
        match router.dispatch(line) {
            Ok(response) => output.response(&response),
            Err(e) => {
                summary.failed += 1;
                output.error(&format!("line {}: {:#}", number, e));
            }
        }
    }

    output.verbose_ctx(
        "repl",
        &format!(
            "dispatched {} command(s), {} failed",
            summary.dispatched, summary.failed
        ),
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::storage::{BookStats, ProgressStore};
    use std::io::Cursor;

    fn router() -> CommandRouter {
        CommandRouter::new(ProgressStore::open_in_memory().unwrap())
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Text, false)
    }

    #[test]
    fn stops_at_end_marker() {
        let mut router = router();
        let input = Cursor::new(
            "add_chapter Algebra Ch1 80\nend\nadd_chapter Algebra Ch2 50\n",
        );

        let summary = run(&mut router, input, &quiet()).unwrap();

        assert_eq!(summary, ReplSummary { dispatched: 1, failed: 0 });
        assert_eq!(router.store().count_chapters("Algebra").unwrap(), 1);
    }

    #[test]
    fn runs_to_end_of_input_without_marker() {
        let mut router = router();
        let input = Cursor::new("add_chapter Algebra Ch1 80\n\n   \nread Algebra Ch1 90");

        let summary = run(&mut router, input, &quiet()).unwrap();

        assert_eq!(summary.dispatched, 2);
        assert_eq!(
            router.store().stats("Algebra").unwrap(),
            BookStats { completed: 1, total: 1 }
        );
    }

    #[test]
    fn failing_lines_do_not_stop_the_loop() {
        let mut router = router();
        let input = Cursor::new(
            "add_chapter Algebra Ch1 80\nskim Algebra Ch1\nread Algebra Ch1 150\nread Algebra Ch1 85\nend\n",
        );

        let summary = run(&mut router, input, &quiet()).unwrap();

        assert_eq!(summary, ReplSummary { dispatched: 4, failed: 2 });
        let progress = router.store().progress("Algebra", "Ch1").unwrap().unwrap();
        assert_eq!(progress.percent.value(), 85);
    }

    #[test]
    fn rejected_reads_are_not_failures() {
        let mut router = router();
        let input = Cursor::new(
            "add_chapter Algebra Ch1 80\nadd_chapter Algebra Ch2 50\nadd_prerequisite_chapter Algebra Ch2 Ch1\nread Algebra Ch2 60\nend\n",
        );

        let summary = run(&mut router, input, &quiet()).unwrap();

        assert_eq!(summary.failed, 0);
        assert!(router.store().progress("Algebra", "Ch2").unwrap().is_none());
    }

    #[test]
    fn invalid_utf8_line_is_reported_and_skipped() {
        let mut router = router();
        let input = Cursor::new(
            b"add_chapter Algebra Ch1 80\nread Algebra Ch1 \xff\nread Algebra Ch1 90\nend\n".to_vec(),
        );

        let summary = run(&mut router, input, &quiet()).unwrap();

        assert_eq!(summary, ReplSummary { dispatched: 3, failed: 1 });
        let progress = router.store().progress("Algebra", "Ch1").unwrap().unwrap();
        assert_eq!(progress.percent.value(), 90);
    }
}
