use crate::analysis::{AnalysisResult, RunSummary};
use crate::ote::SetupDirection;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

fn score_color(score: u32) -> Color {
    match score {
        90.. => Color::Green,
        70..=89 => Color::Yellow,
        _ => Color::DarkGrey,
    }
}

fn setup_color(direction: SetupDirection) -> Color {
    match direction {
        SetupDirection::Long => Color::Cyan,
        SetupDirection::Short => Color::Magenta,
    }
}

fn price_cell(v: f64) -> Cell {
    Cell::new(format!("{:.2}", v)).set_alignment(CellAlignment::Right)
}

/// Highest score first; ties keep the configured symbol order.
fn ranked(summary: &RunSummary) -> Vec<&AnalysisResult> {
    let mut rows: Vec<&AnalysisResult> = summary.results.iter().collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows
}

pub fn build_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Asset").add_attribute(Attribute::Bold),
            Cell::new("Setup").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold).set_alignment(CellAlignment::Right),
            Cell::new("Entry").add_attribute(Attribute::Bold).set_alignment(CellAlignment::Right),
            Cell::new("TP").add_attribute(Attribute::Bold).set_alignment(CellAlignment::Right),
            Cell::new("SL").add_attribute(Attribute::Bold).set_alignment(CellAlignment::Right),
            Cell::new("Score").add_attribute(Attribute::Bold).set_alignment(CellAlignment::Right),
            Cell::new("123").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for res in ranked(summary) {
        table.add_row(vec![
            Cell::new(&res.symbol),
            Cell::new(res.setup_type).fg(setup_color(res.setup_type)),
            price_cell(res.price),
            price_cell(res.recommended_entry),
            price_cell(res.take_profit),
            price_cell(res.stop_loss),
            Cell::new(res.score)
                .fg(score_color(res.score))
                .set_alignment(CellAlignment::Right),
            Cell::new(if res.is_123_rule { "yes" } else { "-" }),
            Cell::new(&res.status).fg(Color::DarkGrey),
        ]);
    }

    table
}

pub fn run(summary: &RunSummary) {
    if summary.results.is_empty() {
        println!("No results to display.");
        return;
    }

    let title = format!("(Analysis run at {})", summary.started_at);
    println!("\n{}\n{}", title, build_table(summary));

    if !summary.skipped.is_empty() {
        let names: Vec<&str> = summary.skipped.iter().map(|s| s.symbol.as_str()).collect();
        println!("Skipped: {}", names.join(", "));
    }
}
