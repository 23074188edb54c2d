//! Terminal rendering of the status table.

mod format;

pub use format::*;

use crate::stats::EndpointSnapshot;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{IsTerminal, Write};
use thiserror::Error;

/// Render error types.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("terminal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Draws full-screen snapshots of all endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn for_stdout() -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::new(color)
    }

    /// Clear the screen and draw one row per endpoint.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        rows: &[EndpointSnapshot],
    ) -> Result<(), RenderError> {
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        writeln!(
            out,
            "{:<14} {:<4}   {:<4} {:>6} | {:>7} | {:>8} | {:>5} | {:<50}",
            "TARGET", "TYPE", "RES", "LAST", "LAST 10", "LAST 100", "COUNT", "HISTORY"
        )?;

        for row in rows {
            let (label, color) = status_of(row);
            let last = row
                .last
                .as_ref()
                .map(|o| format_duration(o.duration))
                .unwrap_or_else(|| "-".to_string());
            let line = format!(
                "{:<14} {:<4}   {:<4} {:>6} | {:>7} | {:>8} | {:>4}x | {:<50}",
                row.endpoint.name,
                row.endpoint.probe_type,
                label,
                last,
                format_duration(row.avg_10),
                format_duration(row.avg_100),
                row.exec_count,
                format_history(&row.history),
            );

            match color.filter(|_| self.color) {
                Some(color) => queue!(
                    out,
                    SetForegroundColor(color),
                    Print(line),
                    ResetColor,
                    Print("\n")
                )?,
                None => writeln!(out, "{}", line)?,
            }
        }

        out.flush()?;
        Ok(())
    }
}

fn status_of(row: &EndpointSnapshot) -> (&'static str, Option<Color>) {
    if row.endpoint.kind().is_err() {
        return ("SKIP", Some(Color::Yellow));
    }
    match &row.last {
        Some(outcome) if outcome.success => ("OK", Some(Color::Green)),
        Some(_) => ("FAIL", Some(Color::Red)),
        None => ("-", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{Endpoint, Outcome};
    use crate::stats::StatStore;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> (Vec<Arc<Endpoint>>, StatStore) {
        let endpoints: Vec<_> = [("web", "http"), ("gateway", "icmp"), ("resolver", "dns")]
            .iter()
            .enumerate()
            .map(|(index, (name, probe_type))| {
                Arc::new(Endpoint {
                    index,
                    name: name.to_string(),
                    probe_type: probe_type.to_string(),
                    destination: "127.0.0.1".to_string(),
                    repeat: Duration::from_secs(1),
                })
            })
            .collect();
        let store = StatStore::new(&endpoints);
        (endpoints, store)
    }

    fn render_plain(rows: &[EndpointSnapshot]) -> String {
        let mut out = Vec::new();
        Renderer::new(false).render(&mut out, rows).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_rows() {
        let (endpoints, store) = store();
        let first =
            Outcome::new(endpoints[0].clone(), true, Utc::now(), Duration::from_millis(120));
        store.record(first).unwrap();
        let second =
            Outcome::new(endpoints[0].clone(), false, Utc::now(), Duration::from_millis(1500));
        store.record(second).unwrap();

        let text = render_plain(&store.snapshot());
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("TARGET"));
        assert!(lines[0].contains("HISTORY"));
        assert_eq!(lines.len(), 4);

        let web = lines[1];
        assert!(web.starts_with("web"));
        assert!(web.contains("FAIL"));
        assert!(web.contains(" 1.50s"));
        assert!(web.contains("   2x"));
        assert!(web.trim_end().ends_with("F."));
        // avg of 120ms and 1500ms
        assert!(web.contains(" 810ms"));
    }

    #[test]
    fn test_render_pending_and_skipped() {
        let (_, store) = store();
        let text = render_plain(&store.snapshot());
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[2].starts_with("gateway"));
        assert!(lines[2].contains("   0x"));
        assert!(!lines[2].contains("FAIL"));

        assert!(lines[3].starts_with("resolver"));
        assert!(lines[3].contains("SKIP"));
    }

    #[test]
    fn test_render_plain_has_no_color_codes() {
        let (endpoints, store) = store();
        store
            .record(Outcome::new(endpoints[1].clone(), true, Utc::now(), Duration::from_millis(3)))
            .unwrap();

        let text = render_plain(&store.snapshot());
        // Only the clear-screen sequence is expected, no SGR color codes
        assert!(!text.contains("\x1b[38;"));
    }

    #[test]
    fn test_render_colored() {
        let (endpoints, store) = store();
        store
            .record(Outcome::new(endpoints[1].clone(), true, Utc::now(), Duration::from_millis(3)))
            .unwrap();

        let mut out = Vec::new();
        Renderer::new(true).render(&mut out, &store.snapshot()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[38;"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_render_failure_is_returned() {
        let (_, store) = store();
        let result = Renderer::new(false).render(&mut BrokenPipe, &store.snapshot());
        assert!(matches!(result, Err(RenderError::Io(_))));
    }
}
