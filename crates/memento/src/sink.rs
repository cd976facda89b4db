//! Printer command sinks.
//!
//! A [`PrintSink`] accepts the five receipt primitives in order. The layout
//! layer never talks to a device directly; it produces
//! [`PrintCommand`]s and [`emit`] replays them into a sink.
//!
//! | Sink | Use case |
//! |------|----------|
//! | [`RecordingSink`] | Tests; can simulate a transport failure |
//! | [`PreviewSink`] | Plain-text rendering to any `io::Write` |

use std::io::Write;

use thiserror::Error;

use crate::layout::{Alignment, PrintCommand, Scale, center, display_width};

#[derive(Debug, Error)]
pub enum SinkError {
    /// The printer could not be reached or dropped the connection.
    #[error("printer transport error: {0}")]
    Transport(String),
    #[error("printer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An ordered command stream into a receipt printer.
pub trait PrintSink {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), SinkError>;
    fn set_scale(&mut self, scale: Scale) -> Result<(), SinkError>;
    /// Print one line of text followed by a line feed.
    fn text_line(&mut self, line: &str) -> Result<(), SinkError>;
    fn barcode(&mut self, payload: &str) -> Result<(), SinkError>;
    fn cut(&mut self) -> Result<(), SinkError>;

    /// Dispatch a single command to the matching primitive.
    fn execute(&mut self, command: &PrintCommand) -> Result<(), SinkError> {
        match command {
            PrintCommand::SetAlignment(a) => self.set_alignment(*a),
            PrintCommand::SetScale(s) => self.set_scale(*s),
            PrintCommand::Text(line) => self.text_line(line),
            PrintCommand::Barcode(payload) => self.barcode(payload),
            PrintCommand::Cut => self.cut(),
        }
    }
}

impl<P: PrintSink + ?Sized> PrintSink for &mut P {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), SinkError> {
        (**self).set_alignment(alignment)
    }
    fn set_scale(&mut self, scale: Scale) -> Result<(), SinkError> {
        (**self).set_scale(scale)
    }
    fn text_line(&mut self, line: &str) -> Result<(), SinkError> {
        (**self).text_line(line)
    }
    fn barcode(&mut self, payload: &str) -> Result<(), SinkError> {
        (**self).barcode(payload)
    }
    fn cut(&mut self) -> Result<(), SinkError> {
        (**self).cut()
    }
}

/// Replay `commands` into `sink`, stopping at the first failure.
pub fn emit<P: PrintSink + ?Sized>(sink: &mut P, commands: &[PrintCommand]) -> Result<(), SinkError> {
    for command in commands {
        sink.execute(command)?;
    }
    Ok(())
}

// ── RecordingSink ──────────────────────────────────────────────────

/// Records every accepted command.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<PrintCommand>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` commands, then fail every later one with a transport error.
    pub fn failing_after(n: usize) -> Self {
        Self {
            commands: Vec::new(),
            fail_after: Some(n),
        }
    }

    pub fn commands(&self) -> &[PrintCommand] {
        &self.commands
    }

    /// Number of cuts seen, i.e. complete receipts.
    pub fn receipts(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PrintCommand::Cut))
            .count()
    }

    fn record(&mut self, command: PrintCommand) -> Result<(), SinkError> {
        if self.fail_after.is_some_and(|n| self.commands.len() >= n) {
            return Err(SinkError::Transport("printer unreachable".into()));
        }
        self.commands.push(command);
        Ok(())
    }
}

impl PrintSink for RecordingSink {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), SinkError> {
        self.record(PrintCommand::SetAlignment(alignment))
    }
    fn set_scale(&mut self, scale: Scale) -> Result<(), SinkError> {
        self.record(PrintCommand::SetScale(scale))
    }
    fn text_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.record(PrintCommand::Text(line.to_string()))
    }
    fn barcode(&mut self, payload: &str) -> Result<(), SinkError> {
        self.record(PrintCommand::Barcode(payload.to_string()))
    }
    fn cut(&mut self) -> Result<(), SinkError> {
        self.record(PrintCommand::Cut)
    }
}

// ── PreviewSink ────────────────────────────────────────────────────

/// Default paper width in normal-scale characters (80 mm paper, font A).
pub const DEFAULT_PAPER_WIDTH: usize = 48;

/// Renders the command stream as plain text.
///
/// Scaled text is aligned within `paper_width / scale.width` columns.
/// Barcodes show as a `[QR] payload` line and cuts as a dashed rule.
pub struct PreviewSink<W> {
    out: W,
    paper_width: usize,
    alignment: Alignment,
    scale: Scale,
}

impl<W: Write> PreviewSink<W> {
    pub fn new(out: W) -> Self {
        Self::with_paper_width(out, DEFAULT_PAPER_WIDTH)
    }

    pub fn with_paper_width(out: W, paper_width: usize) -> Self {
        Self {
            out,
            paper_width,
            alignment: Alignment::Left,
            scale: Scale::NORMAL,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn columns(&self) -> usize {
        self.paper_width / usize::from(self.scale.width.max(1))
    }

    fn aligned(&self, line: &str) -> String {
        let columns = self.columns();
        match self.alignment {
            Alignment::Left => line.to_string(),
            Alignment::Center => center(line, columns).trim_end().to_string(),
            Alignment::Right => {
                let pad = columns.saturating_sub(display_width(line));
                format!("{}{line}", " ".repeat(pad))
            }
        }
    }
}

impl<W: Write> PrintSink for PreviewSink<W> {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), SinkError> {
        self.alignment = alignment;
        Ok(())
    }

    fn set_scale(&mut self, scale: Scale) -> Result<(), SinkError> {
        self.scale = scale;
        Ok(())
    }

    fn text_line(&mut self, line: &str) -> Result<(), SinkError> {
        let rendered = self.aligned(line);
        writeln!(self.out, "{rendered}")?;
        Ok(())
    }

    fn barcode(&mut self, payload: &str) -> Result<(), SinkError> {
        let rendered = self.aligned(&format!("[QR] {payload}"));
        writeln!(self.out, "{rendered}")?;
        Ok(())
    }

    fn cut(&mut self) -> Result<(), SinkError> {
        writeln!(self.out, "{}", "-".repeat(self.paper_width))?;
        self.out.flush()?;
        Ok(())
    }
}
