use super::text::{center, display_width, title_case, wrap};
use super::{Alignment, PrintCommand, Scale};

/// Which receipt region a block renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Body,
    Link,
    Assignee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    None,
    /// Single-line box drawing around the lines.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    Lines(Vec<String>),
    /// Opaque payload rendered as a 2-D barcode by the sink.
    Barcode(String),
}

/// One region of a receipt: content plus the rendering state it needs.
///
/// Blocks carry their own alignment and scale and always end with a reset
/// to left alignment at normal scale, so no state leaks into the next block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintableBlock {
    pub kind: BlockKind,
    pub content: BlockContent,
    pub alignment: Alignment,
    pub scale: Scale,
    pub border: Border,
    /// Nominal line width the content was laid out for.
    pub width: usize,
    pub blank_before: usize,
    pub blank_after: usize,
}

impl PrintableBlock {
    /// Title-cased, wrapped, centered and boxed.
    ///
    /// A word wider than `width` widens the whole box so the border stays
    /// closed.
    pub fn title(text: &str, width: usize, scale: Scale) -> Self {
        let wrapped = wrap(&title_case(text), width);
        let inner = wrapped
            .iter()
            .map(|l| display_width(l))
            .fold(width, usize::max);
        let lines = wrapped.iter().map(|l| center(l, inner)).collect();
        Self {
            kind: BlockKind::Title,
            content: BlockContent::Lines(lines),
            alignment: Alignment::Center,
            scale,
            border: Border::Single,
            width: inner,
            blank_before: 0,
            blank_after: 1,
        }
    }

    /// Title-cased, wrapped and centered paragraph without a border.
    pub fn body(text: &str, width: usize, scale: Scale) -> Self {
        let lines = wrap(&title_case(text), width)
            .iter()
            .map(|l| center(l, width))
            .collect();
        Self {
            kind: BlockKind::Body,
            content: BlockContent::Lines(lines),
            alignment: Alignment::Center,
            scale,
            border: Border::None,
            width,
            blank_before: 0,
            blank_after: 1,
        }
    }

    /// The raw URL as a barcode; no wrapping applies.
    pub fn link(url: &str) -> Self {
        Self {
            kind: BlockKind::Link,
            content: BlockContent::Barcode(url.to_string()),
            alignment: Alignment::Center,
            scale: Scale::NORMAL,
            border: Border::None,
            width: 0,
            blank_before: 0,
            blank_after: 0,
        }
    }

    /// `#name` on one right-aligned line between blank lines.
    pub fn assignee(name: &str, scale: Scale) -> Self {
        let line = format!("#{name}");
        Self {
            kind: BlockKind::Assignee,
            width: display_width(&line),
            content: BlockContent::Lines(vec![line]),
            alignment: Alignment::Right,
            scale,
            border: Border::None,
            blank_before: 1,
            blank_after: 1,
        }
    }

    /// Text lines as they will be printed, borders included, without the
    /// surrounding blank lines.
    pub fn rendered_lines(&self) -> Vec<String> {
        let BlockContent::Lines(lines) = &self.content else {
            return Vec::new();
        };
        match self.border {
            Border::None => lines.clone(),
            Border::Single => {
                let rule = "─".repeat(self.width);
                let mut out = Vec::with_capacity(lines.len() + 2);
                out.push(format!("┌─{rule}─┐"));
                out.extend(lines.iter().map(|l| format!("│ {l} │")));
                out.push(format!("└─{rule}─┘"));
                out
            }
        }
    }

    /// Command stream for this block, ending in a neutral state.
    pub fn commands(&self) -> Vec<PrintCommand> {
        let mut cmds = vec![
            PrintCommand::SetAlignment(self.alignment),
            PrintCommand::SetScale(self.scale),
        ];
        cmds.extend((0..self.blank_before).map(|_| PrintCommand::Text(String::new())));
        match &self.content {
            BlockContent::Lines(_) => {
                cmds.extend(self.rendered_lines().into_iter().map(PrintCommand::Text));
            }
            BlockContent::Barcode(payload) => {
                cmds.push(PrintCommand::Barcode(payload.clone()));
            }
        }
        cmds.extend((0..self.blank_after).map(|_| PrintCommand::Text(String::new())));
        cmds.push(PrintCommand::SetAlignment(Alignment::Left));
        cmds.push(PrintCommand::SetScale(Scale::NORMAL));
        cmds
    }
}
