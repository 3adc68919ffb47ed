//! Page layout of a service receipt.

use crate::domain::receipt::ServiceReport;
use crate::domain::types::ReceiptNumber;
use crate::render::canvas::{ImageHandle, PAGE_HEIGHT, PAGE_WIDTH, PageCanvas, Rgb};
use crate::render::fonts::{Font, wrap_text};

pub const TITLE: &str = "Boleta de Servicio";
pub const CLIENT_HEADING: &str = "Datos del Cliente";
pub const CHECKLIST_HEADING: &str = "Checklist:";
pub const EMPTY_CHECKLIST: &str = "No se seleccionó ningún ítem del checklist.";
pub const COMMENTS_HEADING: &str = "Comentarios:";
pub const NO_COMMENTS: &str = "Sin comentarios.";
pub const SIGNER_PLACEHOLDER: &str = "__________";
pub const FOOTER: &str = "© JYM ELECTROMECÁNICA - Todos los derechos reservados";

const MARGIN: f32 = 50.0;
const TEXT_INSET: f32 = 60.0;
const PANEL_RADIUS: f32 = 5.0;
const PANEL_GAP: f32 = 10.0;

const LOGO_X: f32 = 50.0;
const LOGO_Y: f32 = 40.0;
const LOGO_WIDTH: f32 = 100.0;
const LOGO_RADIUS: f32 = 15.0;
const CONTENT_TOP: f32 = 150.0;
/// Panels never extend past this line; the footer sits below it.
const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - MARGIN;

const CLIENT_PANEL_MIN_HEIGHT: f32 = 160.0;
const CHECKLIST_COLUMNS: usize = 2;
const CHECKLIST_ROW_STEP: f32 = 19.0;
const COMMENTS_PANEL_MIN_HEIGHT: f32 = 60.0;
const SIGNER_PANEL_MIN_HEIGHT: f32 = 40.0;
const FOOTER_OFFSET: f32 = 40.0;

pub const PHOTOS_PER_PAGE: usize = 6;
const PHOTO_COLUMNS: usize = 2;
const PHOTO_WIDTH: f32 = 250.0;
const PHOTO_HEIGHT: f32 = 180.0;
const PHOTO_GAP: f32 = 15.0;

const TITLE_BLUE: Rgb = Rgb::hex(0x0D47A1);
const NUMBER_GRAY: Rgb = Rgb::hex(0x424242);
const RULE_BLUE: Rgb = Rgb::hex(0x90CAF9);
const PANEL_FILL: Rgb = Rgb::hex(0xE3F2FD);
const PANEL_STROKE: Rgb = Rgb::hex(0xCCCCCC);
const HEADING_INDIGO: Rgb = Rgb::hex(0x1A237E);
const BODY_BLACK: Rgb = Rgb::hex(0x000000);
const FOOTER_GRAY: Rgb = Rgb::hex(0x808080);

fn panel_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

/// Width available to text inside a panel.
fn section_width() -> f32 {
    PAGE_WIDTH - 2.0 * TEXT_INSET
}

/// One line of panel text. Every cell shares the line's top.
struct PanelLine {
    font: Font,
    size: f32,
    color: Rgb,
    cells: Vec<(f32, String)>,
    advance: f32,
}

impl PanelLine {
    fn single(font: Font, size: f32, color: Rgb, text: String, advance: f32) -> Self {
        Self {
            font,
            size,
            color,
            cells: vec![(TEXT_INSET, text)],
            advance,
        }
    }

    fn heading(size: f32, text: &str, advance: f32) -> Self {
        Self::single(Font::Bold, size, HEADING_INDIGO, text.to_string(), advance)
    }

    fn body(text: String) -> Self {
        Self::single(
            Font::Regular,
            12.0,
            BODY_BLACK,
            text,
            Font::Regular.line_height(12.0),
        )
    }
}

/// A rounded panel sized by its content.
struct Panel {
    lines: Vec<PanelLine>,
    padding_top: f32,
    padding_bottom: f32,
    min_height: f32,
}

/// Front-matter pages filled top-down. Content reaching [`CONTENT_BOTTOM`]
/// continues on a new page.
struct PageFlow {
    finished: Vec<PageCanvas>,
    current: PageCanvas,
    y: f32,
    fresh_page: bool,
}

impl PageFlow {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: PageCanvas::new(),
            y: CONTENT_TOP,
            fresh_page: false,
        }
    }

    fn break_page(&mut self) {
        let full = std::mem::take(&mut self.current);
        self.finished.push(full);
        self.y = MARGIN;
        self.fresh_page = true;
    }

    /// Draws `panel` at the cursor, splitting it between lines when it does
    /// not fit on the current page.
    fn panel(&mut self, panel: Panel) {
        let Panel {
            lines,
            padding_top,
            padding_bottom,
            min_height,
        } = panel;
        let mut lines = lines.into_iter().peekable();
        let mut first_segment = true;

        while let Some(next) = lines.peek() {
            let needed = padding_top + next.advance + padding_bottom;
            if !self.fresh_page && self.y + needed > CONTENT_BOTTOM {
                self.break_page();
            }

            let top = self.y;
            let mut height = padding_top;
            let mut segment = Vec::new();
            while let Some(line) = lines.peek() {
                if !segment.is_empty()
                    && top + height + line.advance + padding_bottom > CONTENT_BOTTOM
                {
                    break;
                }
                height += line.advance;
                if let Some(line) = lines.next() {
                    segment.push(line);
                }
            }
            height += padding_bottom;
            if first_segment && lines.peek().is_none() {
                height = height.max(min_height).min(CONTENT_BOTTOM - top);
            }

            draw_panel(&mut self.current, top, height);
            let mut line_top = top + padding_top;
            for line in segment {
                for (x, text) in &line.cells {
                    self.current.text(line.font, line.size, line.color, *x, line_top, text);
                }
                line_top += line.advance;
            }

            self.y = top + height + PANEL_GAP;
            self.fresh_page = false;
            first_segment = false;
        }
    }

    /// Closes the last page. Only the first page carries the footer.
    fn finish(mut self) -> Vec<PageCanvas> {
        self.finished.push(self.current);
        if let Some(first) = self.finished.first_mut() {
            draw_footer(first);
        }
        self.finished
    }
}

/// Lays out the receipt body: logo, title block, panels and footer. Long
/// content spills onto continuation pages; at least one page is returned.
pub fn draw_front_pages(
    report: &ServiceReport,
    number: ReceiptNumber,
    logo: Option<&ImageHandle>,
) -> Vec<PageCanvas> {
    let mut flow = PageFlow::new();

    if let Some(logo) = logo {
        let height = LOGO_WIDTH / logo.aspect_ratio();
        flow.current.clip_rounded(LOGO_X, LOGO_Y, LOGO_WIDTH, height, LOGO_RADIUS);
        flow.current.image(logo, LOGO_X, LOGO_Y, LOGO_WIDTH, height);
        flow.current.restore_state();
    }

    flow.y = draw_title_block(&mut flow.current, number);
    flow.panel(client_panel(report));
    flow.panel(checklist_panel(report));
    flow.panel(comments_panel(report));
    flow.panel(signer_panel(report));
    flow.finish()
}

fn draw_title_block(canvas: &mut PageCanvas, number: ReceiptNumber) -> f32 {
    let mut y = CONTENT_TOP;

    canvas.text_centered(
        Font::Bold,
        26.0,
        TITLE_BLUE,
        MARGIN,
        panel_width(),
        y,
        TITLE,
    );
    y += Font::Bold.line_height(26.0);
    y += 0.3 * Font::Regular.line_height(20.0);

    canvas.text_centered(
        Font::Regular,
        20.0,
        NUMBER_GRAY,
        MARGIN,
        panel_width(),
        y,
        &format!("N° {number}"),
    );
    y += Font::Regular.line_height(20.0);
    y += 0.5 * Font::Regular.line_height(20.0);

    canvas.horizontal_rule(100.0, PAGE_WIDTH - 100.0, y, RULE_BLUE, 2.0);
    y + Font::Regular.line_height(20.0)
}

fn draw_panel(canvas: &mut PageCanvas, top: f32, height: f32) {
    canvas.rounded_panel(
        MARGIN,
        top,
        panel_width(),
        height,
        PANEL_RADIUS,
        PANEL_FILL,
        PANEL_STROKE,
    );
}

fn wrapped_body(text: &str, lines: &mut Vec<PanelLine>) {
    for line in wrap_text(Font::Regular, 12.0, text, section_width()) {
        lines.push(PanelLine::body(line));
    }
}

fn client_panel(report: &ServiceReport) -> Panel {
    let mut lines = vec![PanelLine::heading(
        14.0,
        CLIENT_HEADING,
        Font::Bold.line_height(14.0) + 0.5 * Font::Regular.line_height(12.0),
    )];
    for line in report.client_lines() {
        wrapped_body(&line, &mut lines);
    }

    Panel {
        lines,
        padding_top: 0.5 * Font::Regular.line_height(20.0) + 10.0,
        padding_bottom: 10.0,
        min_height: CLIENT_PANEL_MIN_HEIGHT,
    }
}

/// Wraps one checklist entry to `width`, bullet on the first line and
/// continuation lines aligned with its text.
fn checklist_entry(item: &str, width: f32) -> Vec<String> {
    let bullet = "• ";
    let indent = Font::Regular.text_width(bullet, 12.0);
    wrap_text(Font::Regular, 12.0, item, width - indent)
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("{bullet}{line}")
            } else {
                line
            }
        })
        .collect()
}

fn checklist_panel(report: &ServiceReport) -> Panel {
    let mut lines = vec![PanelLine::heading(13.0, CHECKLIST_HEADING, 25.0)];

    if report.checklist.is_empty() {
        lines.push(PanelLine::single(
            Font::Regular,
            12.0,
            BODY_BLACK,
            EMPTY_CHECKLIST.to_string(),
            CHECKLIST_ROW_STEP,
        ));
    } else {
        let column_width = (section_width() - 20.0) / 2.0;
        let continuation = Font::Regular.text_width("• ", 12.0);
        for row in report.checklist.chunks(CHECKLIST_COLUMNS) {
            let columns: Vec<(f32, Vec<String>)> = row
                .iter()
                .zip([TEXT_INSET, PAGE_WIDTH / 2.0])
                .map(|(item, x)| (x, checklist_entry(item.as_str(), column_width)))
                .collect();
            let depth = columns.iter().map(|(_, l)| l.len()).max().unwrap_or(1);

            for index in 0..depth {
                let cells = columns
                    .iter()
                    .filter_map(|(x, entry)| {
                        let x = if index == 0 { *x } else { *x + continuation };
                        entry.get(index).map(|text| (x, text.clone()))
                    })
                    .collect();
                let advance = if index + 1 == depth {
                    CHECKLIST_ROW_STEP
                } else {
                    Font::Regular.line_height(12.0)
                };
                lines.push(PanelLine {
                    font: Font::Regular,
                    size: 12.0,
                    color: BODY_BLACK,
                    cells,
                    advance,
                });
            }
        }
    }

    Panel {
        lines,
        padding_top: 10.0,
        padding_bottom: 5.0,
        min_height: 0.0,
    }
}

fn comments_panel(report: &ServiceReport) -> Panel {
    let mut lines = vec![PanelLine::heading(
        13.0,
        COMMENTS_HEADING,
        Font::Bold.line_height(13.0) + 4.0,
    )];
    let comments = report.comments.as_ref().map_or(NO_COMMENTS, |c| c.as_str());
    wrapped_body(comments, &mut lines);

    Panel {
        lines,
        padding_top: 10.0,
        padding_bottom: 10.0,
        min_height: COMMENTS_PANEL_MIN_HEIGHT,
    }
}

fn signer_panel(report: &ServiceReport) -> Panel {
    let technician = report
        .technician
        .as_ref()
        .map_or(SIGNER_PLACEHOLDER, |t| t.as_str());
    let mut lines = Vec::new();
    wrapped_body(&format!("Encargado del servicio: {technician}"), &mut lines);

    Panel {
        lines,
        padding_top: 10.0,
        padding_bottom: 10.0,
        min_height: SIGNER_PANEL_MIN_HEIGHT,
    }
}

fn draw_footer(canvas: &mut PageCanvas) {
    canvas.text_centered(
        Font::Regular,
        10.0,
        FOOTER_GRAY,
        0.0,
        PAGE_WIDTH,
        PAGE_HEIGHT - FOOTER_OFFSET,
        FOOTER,
    );
}

/// Draws up to [`PHOTOS_PER_PAGE`] photos in a two-column grid. A `None`
/// slot stays empty.
pub fn draw_gallery_page(canvas: &mut PageCanvas, photos: &[Option<ImageHandle>]) {
    for (index, photo) in photos.iter().enumerate().take(PHOTOS_PER_PAGE) {
        let Some(photo) = photo else {
            continue;
        };
        let row = index / PHOTO_COLUMNS;
        let column = index % PHOTO_COLUMNS;
        let x = MARGIN + column as f32 * (PHOTO_WIDTH + PHOTO_GAP);
        let y = MARGIN + row as f32 * (PHOTO_HEIGHT + PHOTO_GAP);
        canvas.image(photo, x, y, PHOTO_WIDTH, PHOTO_HEIGHT);
    }
}
