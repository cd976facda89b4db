//! Receipt layout.
//!
//! A [`Receipt`] is composed from the reminder's title and its
//! [`ExtractedFields`](crate::extract::ExtractedFields) as an ordered list of
//! [`PrintableBlock`]s: Title, then Body, Link and Assignee when their field
//! is present. Flattening a receipt yields the [`PrintCommand`] stream a
//! [`PrintSink`](crate::sink::PrintSink) consumes, terminated by one cut.

mod block;
mod text;

pub use block::{BlockContent, BlockKind, Border, PrintableBlock};
pub use text::{center, display_width, same_text, title_case, wrap};

use serde::{Deserialize, Serialize};

use crate::extract::ExtractedFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Character magnification relative to normal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub width: u8,
    pub height: u8,
}

impl Scale {
    pub const NORMAL: Scale = Scale::new(1, 1);
    /// 2× horizontal, 1× vertical.
    pub const WIDE: Scale = Scale::new(2, 1);
    pub const DOUBLE: Scale = Scale::new(2, 2);

    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }
}

/// Primitive accepted by a printer sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintCommand {
    SetAlignment(Alignment),
    SetScale(Scale),
    /// One line of text; the sink terminates it.
    Text(String),
    Barcode(String),
    Cut,
}

/// Widths and scales for each block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub title_width: usize,
    pub body_width: usize,
    pub title_scale: Scale,
    pub body_scale: Scale,
    pub assignee_scale: Scale,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            title_width: 20,
            body_width: 22,
            title_scale: Scale::DOUBLE,
            body_scale: Scale::WIDE,
            assignee_scale: Scale::WIDE,
        }
    }
}

/// The blocks printed for one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    blocks: Vec<PrintableBlock>,
}

impl Receipt {
    /// Lay out a reminder.
    ///
    /// `title` is the reminder's own title; when blank, the extracted title
    /// is printed instead. The body is dropped when it repeats either title.
    pub fn compose(title: &str, fields: &ExtractedFields, config: &LayoutConfig) -> Self {
        let printed_title = if title.trim().is_empty() {
            fields.title.as_str()
        } else {
            title
        };

        let mut blocks = vec![PrintableBlock::title(
            printed_title,
            config.title_width,
            config.title_scale,
        )];

        if let Some(body) = fields
            .text
            .as_deref()
            .filter(|b| !same_text(b, &fields.title) && !same_text(b, printed_title))
        {
            blocks.push(PrintableBlock::body(
                body,
                config.body_width,
                config.body_scale,
            ));
        }
        if let Some(link) = &fields.link {
            blocks.push(PrintableBlock::link(link));
        }
        if let Some(assignee) = &fields.assignee {
            blocks.push(PrintableBlock::assignee(assignee, config.assignee_scale));
        }

        Self { blocks }
    }

    pub fn blocks(&self) -> &[PrintableBlock] {
        &self.blocks
    }

    pub fn kinds(&self) -> Vec<BlockKind> {
        self.blocks.iter().map(|b| b.kind).collect()
    }

    /// Every block's commands in order, then a cut.
    pub fn commands(&self) -> Vec<PrintCommand> {
        let mut cmds: Vec<PrintCommand> = self.blocks.iter().flat_map(|b| b.commands()).collect();
        cmds.push(PrintCommand::Cut);
        cmds
    }
}
