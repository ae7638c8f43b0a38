use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Right,
}

/// Plain-text table for the timeline and verdict output. Widths count
/// characters, not bytes, so arrows and other symbols line up.
#[derive(Debug)]
pub struct Table {
    columns: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn line<'a>(&self, widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
        let padded: Vec<String> = cells
            .zip(widths.iter().zip(&self.columns))
            .map(|(cell, (&w, (_, align)))| match align {
                Align::Left => format!("{cell:<w$}"),
                Align::Right => format!("{cell:>w$}"),
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(self.line(&widths, self.columns.iter().map(|(h, _)| *h)));
        out.push(
            widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            out.push(self.line(&widths, row.iter().map(String::as_str)));
        }
        out.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_align_right() {
        let mut t = Table::new(&[("STEP", Align::Left), ("EVENTS", Align::Right)]);
        t.row(vec!["draw hull".into(), "7".into()])
            .row(vec!["draw pullers".into(), "11".into()]);
        assert_eq!(
            t.render(),
            "STEP          EVENTS\n\
             ------------  ------\n\
             draw hull          7\n\
             draw pullers      11"
        );
    }

    #[test]
    fn widths_count_characters() {
        let mut t = Table::new(&[("LEG", Align::Left), ("D", Align::Left)]);
        t.row(vec!["a → b".into(), "1 km".into()]);
        let rendered = t.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "-----  ----");
        assert_eq!(lines[2], "a → b  1 km");
    }
}
