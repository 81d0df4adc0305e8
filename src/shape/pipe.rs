//! Pipe-delimited tables such as refund and overtime-charge schedules:
//!
//! ```text
//! 7일 전|100% 환불
//! 3일 전|50% 환불
//! ```
//!
//! Lines without a `|` are kept verbatim. Each non-empty cell of a row is an
//! atom; the whitespace around it is kept when the translation goes back in.

#[derive(Debug, Clone, PartialEq)]
pub struct PipeTable {
    lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Text(String),
    Row(Vec<Cell>),
}

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    leading: String,
    content: String,
    trailing: String,
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let content = raw.trim();
        if content.is_empty() {
            return Cell {
                leading: raw.to_string(),
                content: String::new(),
                trailing: String::new(),
            };
        }
        let start = raw.len() - raw.trim_start().len();
        let end = start + content.len();
        Cell {
            leading: raw[..start].to_string(),
            content: content.to_string(),
            trailing: raw[end..].to_string(),
        }
    }
}

impl PipeTable {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| {
                if line.contains('|') {
                    Line::Row(line.split('|').map(Cell::parse).collect())
                } else {
                    Line::Text(line.to_string())
                }
            })
            .collect();
        Self { lines }
    }

    /// Non-empty cell contents in row-major order.
    pub fn atoms(&self) -> Vec<String> {
        self.cells().map(|c| c.content.clone()).collect()
    }

    /// Render the table with `translated[i]` in place of atom `i`.
    ///
    /// A translation containing `|` or a line break would split the row, so
    /// those are replaced before insertion.
    pub fn render(&self, translated: &[String]) -> String {
        let mut replacements = translated.iter();
        self.lines
            .iter()
            .map(|line| match line {
                Line::Text(text) => text.clone(),
                Line::Row(cells) => cells
                    .iter()
                    .map(|cell| {
                        if cell.content.is_empty() {
                            return cell.leading.clone();
                        }
                        let content = replacements
                            .next()
                            .map(|t| sanitize_cell(t))
                            .unwrap_or_else(|| cell.content.clone());
                        format!("{}{}{}", cell.leading, content, cell.trailing)
                    })
                    .collect::<Vec<_>>()
                    .join("|"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of lines and the cell count of each line (0 for text lines).
    pub fn layout(&self) -> Vec<usize> {
        self.lines
            .iter()
            .map(|line| match line {
                Line::Text(_) => 0,
                Line::Row(cells) => cells.len(),
            })
            .collect()
    }

    fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Row(cells) => Some(cells),
                Line::Text(_) => None,
            })
            .flatten()
            .filter(|cell| !cell.content.is_empty())
    }
}

fn sanitize_cell(text: &str) -> String {
    let text = text.trim();
    if !text.contains(['|', '\n', '\r']) {
        return text.to_string();
    }
    text.replace('|', "/")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}
