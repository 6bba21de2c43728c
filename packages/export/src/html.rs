use crate::{ExportError, ExportFormat, Exporter, Snapshot};

/// Options for HTML export
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Emit the print stylesheet
    pub print_styles: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            print_styles: true,
        }
    }
}

/// Print-ready HTML page holding the snapshot as one table
#[derive(Debug, Clone, Default)]
pub struct HtmlExporter {
    pub options: HtmlOptions,
}

impl HtmlExporter {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }
}

const PRINT_STYLES: &str = "body { font-family: sans-serif; margin: 2rem; } \
table { border-collapse: collapse; width: 100%; } \
th, td { border: 1px solid #444; padding: 4px 8px; text-align: left; } \
th { background: #eee; } \
@media print { body { margin: 0; } thead { display: table-header-group; } tr { page-break-inside: avoid; } }";

struct Context<'a> {
    options: &'a HtmlOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a HtmlOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
        self.buffer.push_str(text);
        if self.options.pretty {
            self.buffer.push('\n');
        }
    }

    fn open(&mut self, tag: &str) {
        self.add_line(&format!("<{}>", tag));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.add_line(&format!("</{}>", tag));
    }

    fn cells(&mut self, tag: &str, cells: &[String]) {
        self.open("tr");
        for cell in cells {
            self.add_line(&format!("<{tag}>{}</{tag}>", escape_html(cell)));
        }
        self.close("tr");
    }
}

impl Exporter for HtmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
        let mut ctx = Context::new(&self.options);
        let title = escape_html(&snapshot.title);

        ctx.add_line("<!DOCTYPE html>");
        ctx.open("html");

        ctx.open("head");
        ctx.add_line("<meta charset=\"utf-8\">");
        ctx.add_line(&format!("<title>{}</title>", title));
        if self.options.print_styles {
            ctx.add_line(&format!("<style>{}</style>", PRINT_STYLES));
        }
        ctx.close("head");

        ctx.open("body");
        ctx.add_line(&format!("<h1>{}</h1>", title));
        ctx.open("table");
        ctx.open("thead");
        ctx.cells("th", &snapshot.labels);
        ctx.close("thead");
        ctx.open("tbody");
        for row in &snapshot.table.rows {
            ctx.cells("td", row);
        }
        ctx.close("tbody");
        ctx.close("table");
        ctx.add_line(&format!(
            "<footer>Generated {}</footer>",
            snapshot.generated.format("%Y-%m-%d %H:%M UTC")
        ));
        ctx.close("body");

        ctx.close("html");
        Ok(ctx.buffer.into_bytes())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
