/// Share card layout: turns a `DailySummary` into paint commands.
///
/// The vertical position is carried explicitly as a [`Cursor`] value that each
/// drawing step consumes and returns, so the whole layout can be checked with
/// a fake measurer and without touching pixels.
use crate::rendering::paint::{FontWeight, PaintCommand, Rgba, TextStyle};
use crate::rendering::qr::CodeEncoder;
use crate::rendering::text::TextMeasure;
use crate::rendering::{CardLayout, CardTheme, CARD_HEIGHT, CARD_WIDTH};
use crate::summary::DailySummary;
use crate::Error;

pub const TITLE: &str = "今朝·今日进度";
pub const TODOS_HEADING: &str = "待办";
pub const NOTES_HEADING: &str = "笔记";
pub const EMPTY_TODOS: &str = "今天还没有待办";
pub const EMPTY_NOTES: &str = "今天还没有笔记";
pub const DONE_PREFIX: &str = "✅ ";
pub const PENDING_PREFIX: &str = "• ";
pub const CODE_CAPTION: &str = "扫码打开朝暮记";
pub const ATTRIBUTION: &str = "由 朝暮记 生成";

/// Baseline of the next line to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub y: f32,
}

impl Cursor {
    pub const fn at(y: f32) -> Self {
        Self { y }
    }

    #[must_use]
    pub fn advance(self, dy: f32) -> Self {
        Self { y: self.y + dy }
    }
}

/// Outcome of [`wrap_text`]: the lines to draw and where the cursor ends up.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapped {
    pub lines: Vec<String>,
    pub cursor: Cursor,
}

/// Greedy per-character wrap.
///
/// Characters are appended one at a time; when the candidate line measures
/// wider than `max_width` and the current line already holds something, the
/// line is flushed and the character starts the next one. At most
/// `max_lines` lines are produced and the remainder is dropped. Each produced
/// line advances the cursor by `line_height`; an empty string produces no
/// line and leaves the cursor where it was. Control characters such as
/// line breaks are drawn as spaces.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    measure: &mut M,
    text: &str,
    style: &TextStyle,
    max_width: f32,
    line_height: f32,
    max_lines: usize,
    cursor: Cursor,
) -> Wrapped {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    if max_lines > 0 {
        for c in text.chars() {
            let c = if c.is_control() { ' ' } else { c };
            let mut candidate = line.clone();
            candidate.push(c);
            if !line.is_empty() && measure.measure(&candidate, style) > max_width {
                lines.push(std::mem::take(&mut line));
                if lines.len() >= max_lines {
                    break;
                }
                line.push(c);
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() && lines.len() < max_lines {
            lines.push(line);
        }
    }

    let cursor = cursor.advance(line_height * lines.len() as f32);
    Wrapped { lines, cursor }
}

/// Result of composing a card.
#[derive(Debug, Clone)]
pub struct Composition {
    pub commands: Vec<PaintCommand>,
    /// User-facing explanation when part of the card had to be left out
    pub notice: Option<String>,
    pub drawn_todos: usize,
    pub drawn_notes: usize,
}

/// Paint-command builder bound to a measurer.
pub struct CardCanvas<'a, M: TextMeasure + ?Sized> {
    measure: &'a mut M,
    layout: &'a CardLayout,
    commands: Vec<PaintCommand>,
}

impl<'a, M: TextMeasure + ?Sized> CardCanvas<'a, M> {
    pub fn new(measure: &'a mut M, layout: &'a CardLayout) -> Self {
        Self { measure, layout, commands: Vec::new() }
    }

    fn content_width(&self) -> f32 {
        CARD_WIDTH as f32 - self.layout.margin * 2.0
    }

    pub fn push(&mut self, cmd: PaintCommand) {
        self.commands.push(cmd);
    }

    pub fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        self.measure.measure(text, style)
    }

    /// Single unwrapped line at `x`; returns the cursor moved by `line_height`.
    pub fn line(&mut self, cursor: Cursor, x: f32, text: &str, style: TextStyle, rgba: Rgba, line_height: f32) -> Cursor {
        self.push(PaintCommand::Text { x, y: cursor.y, text: text.to_string(), style, rgba });
        cursor.advance(line_height)
    }

    /// Single line whose right edge sits at `right`.
    pub fn line_right(&mut self, cursor: Cursor, right: f32, text: &str, style: TextStyle, rgba: Rgba) {
        let w = self.measure(text, &style);
        self.push(PaintCommand::Text { x: right - w, y: cursor.y, text: text.to_string(), style, rgba });
    }

    /// Wrapped text across the content width.
    pub fn wrapped(&mut self, cursor: Cursor, text: &str, style: TextStyle, rgba: Rgba, line_height: f32, max_lines: usize) -> Cursor {
        let max_width = self.content_width();
        let wrapped = wrap_text(&mut *self.measure, text, &style, max_width, line_height, max_lines, cursor);
        let x = self.layout.margin;
        for (i, text) in wrapped.lines.into_iter().enumerate() {
            self.push(PaintCommand::Text { x, y: cursor.y + line_height * i as f32, text, style, rgba });
        }
        wrapped.cursor
    }

    pub fn finish(self) -> Vec<PaintCommand> {
        self.commands
    }
}

/// Lay out the full card for `summary`.
///
/// Code generation failure never aborts the layout: the code region is left
/// out and [`Composition::notice`] explains why.
pub fn compose<M: TextMeasure + ?Sized>(
    summary: &DailySummary,
    layout: &CardLayout,
    theme: &CardTheme,
    measure: &mut M,
    encoder: &dyn CodeEncoder,
) -> Composition {
    let width = CARD_WIDTH as f32;
    let height = CARD_HEIGHT as f32;
    let margin = layout.margin;
    let mut canvas = CardCanvas::new(measure, layout);

    canvas.push(PaintCommand::VerticalGradient { top: theme.gradient_top, bottom: theme.gradient_bottom });
    let inset = layout.border_inset;
    canvas.push(PaintCommand::RoundedBorder {
        x: inset,
        y: inset,
        width: width - inset * 2.0,
        height: height - inset * 2.0,
        radius: layout.border_radius,
        stroke_width: layout.border_width,
        rgba: theme.border,
    });

    // Header
    let title_style = TextStyle::new(layout.title_size, FontWeight::Bold);
    let date_style = TextStyle::new(layout.date_size, FontWeight::Medium);
    let header = Cursor::at(layout.header_baseline);
    canvas.line(header, margin, TITLE, title_style, theme.text, 0.0);
    canvas.line_right(header, width - margin, &summary.date_label, date_style, theme.accent);
    let divider_y = header.y + layout.divider_gap;
    canvas.push(PaintCommand::Line {
        x1: margin,
        y1: divider_y,
        x2: width - margin,
        y2: divider_y,
        stroke_width: 2.0,
        rgba: theme.divider,
    });
    let mut cursor = Cursor::at(divider_y).advance(layout.section_gap);

    let body = TextStyle::new(layout.body_size, FontWeight::Regular);
    let item = TextStyle::new(layout.item_size, FontWeight::Regular);
    let heading = TextStyle::new(layout.heading_size, FontWeight::Medium);

    // Context (weather / calendar), only when the summary carries it
    let context = summary.enrichment.card_lines();
    if !context.is_empty() {
        for text in &context {
            cursor = canvas.wrapped(cursor, text, body, theme.accent, layout.body_line_height, layout.context_max_lines);
        }
        cursor = cursor.advance(layout.section_gap - layout.body_line_height);
    }

    // Todos
    cursor = canvas.line(cursor, margin, TODOS_HEADING, heading, theme.text, layout.heading_line_height);
    let counter = format!("完成 {}/{}", summary.todo_stats.completed, summary.todo_stats.total);
    cursor = canvas.line(cursor, margin, &counter, body, theme.text, layout.body_line_height);
    let shown_todos: Vec<_> = summary.todos.iter().take(layout.max_todos).collect();
    for todo in &shown_todos {
        let (prefix, rgba) = if todo.done {
            (DONE_PREFIX, theme.done())
        } else {
            (PENDING_PREFIX, theme.text)
        };
        let text = format!("{prefix}{}", todo.title);
        cursor = canvas.wrapped(cursor, &text, item, rgba, layout.item_line_height, layout.item_max_lines);
        cursor = cursor.advance(layout.item_gap);
    }
    if shown_todos.is_empty() {
        cursor = canvas.line(cursor, margin, EMPTY_TODOS, item, theme.muted, layout.item_line_height + layout.item_gap);
    }

    // Notes
    cursor = cursor.advance(layout.section_gap - layout.item_line_height);
    cursor = canvas.line(cursor, margin, NOTES_HEADING, heading, theme.text, layout.heading_line_height);
    let counter = format!("新增 {} 条", summary.note_count);
    cursor = canvas.line(cursor, margin, &counter, body, theme.text, layout.body_line_height);
    let shown_notes: Vec<_> = summary.notes.iter().take(layout.max_notes).collect();
    for note in &shown_notes {
        let text = format!("{PENDING_PREFIX}{}", note.text);
        cursor = canvas.wrapped(cursor, &text, item, theme.text, layout.item_line_height, layout.item_max_lines);
        cursor = cursor.advance(layout.item_gap);
    }
    if shown_notes.is_empty() {
        cursor = canvas.line(cursor, margin, EMPTY_NOTES, item, theme.muted, layout.item_line_height);
    }
    log::debug!("card body ends at y={:.0}", cursor.y);

    // Code, bottom-right
    let mut notice = None;
    let code_x = width - margin - layout.code_size;
    let code_y = height - margin - layout.code_size;
    match encoder.encode(&summary.share_target_url) {
        Ok(matrix) => {
            let caption = TextStyle::new(layout.caption_size, FontWeight::Regular);
            canvas.line_right(Cursor::at(code_y - layout.caption_gap), width - margin, CODE_CAPTION, caption, theme.muted);
            canvas.push(PaintCommand::Code {
                x: code_x,
                y: code_y,
                size: layout.code_size,
                quiet_zone: layout.code_quiet_zone,
                matrix,
                dark: theme.code_dark,
                light: theme.code_light,
            });
        }
        Err(err) => {
            log::warn!("share code omitted: {}", err);
            let err = match err {
                Error::CodeError(_) => err,
                other => Error::CodeError(other.to_string()),
            };
            notice = Some(err.user_message());
        }
    }

    // Attribution, bottom-left
    let attribution = TextStyle::new(layout.attribution_size, FontWeight::Regular);
    canvas.line(Cursor::at(height - margin), margin, ATTRIBUTION, attribution, theme.muted, 0.0);

    Composition {
        commands: canvas.finish(),
        notice,
        drawn_todos: shown_todos.len(),
        drawn_notes: shown_notes.len(),
    }
}
