use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::agent::HttpAgentClient;
use crate::cli::open_store;
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::insights::InsightsPanel;
use crate::models::InsightResponse;
use crate::settings::load_settings;

const WRAP_WIDTH: usize = 80;

pub async fn run(agent_id: Option<String>) -> Result<()> {
    let settings = load_settings();
    let store = open_store()?;
    let agent = HttpAgentClient::from_settings(&settings)?;
    let agent_id = agent_id.unwrap_or_else(|| settings.agent_id.clone());
    let mut panel = InsightsPanel::new(agent, agent_id);

    if !store.list().is_empty() {
        println!("{}", "Analyzing your transactions...".dimmed());
    }
    let outcome = panel.request(store.list()).await.map(|_| ());
    if let Err(e) = outcome {
        // main prints the banner; the cause is already in the log
        let banner = panel.error().map(|b| TallyError::Other(b.to_string()));
        panel.dismiss_error();
        return Err(banner.unwrap_or(e));
    }
    if let Some(insights) = panel.insights() {
        print_insights(insights);
    }
    Ok(())
}

fn print_insights(insights: &InsightResponse) {
    let s = &insights.summary;
    let mut summary = Table::new();
    summary.set_header(vec!["Income", "Expenses", "Net", "Savings Rate", "Top Category"]);
    summary.add_row(vec![
        Cell::new(money(s.total_income)),
        Cell::new(money(s.total_expenses)),
        Cell::new(money(s.net_balance)),
        Cell::new(s.savings_rate.map(|r| format!("{r:.1}%")).unwrap_or_default()),
        Cell::new(s.top_category.clone().unwrap_or_default()),
    ]);
    println!("Summary\n{summary}");

    if !insights.insights.trim().is_empty() {
        println!("\n{}", "Insights".bold());
        println!("{}", textwrap::fill(&insights.insights, WRAP_WIDTH));
    }

    if !insights.tips.is_empty() {
        println!("\n{}", "Tips".bold());
        for tip in &insights.tips {
            let options = textwrap::Options::new(WRAP_WIDTH)
                .initial_indent("  - ")
                .subsequent_indent("    ");
            let wrapped = textwrap::fill(tip, options);
            println!("{wrapped}");
        }
    }

    let suggestions: Vec<_> = insights
        .categorized_transactions
        .iter()
        .filter_map(|c| {
            c.suggested_category
                .as_deref()
                .filter(|s| !s.eq_ignore_ascii_case(&c.category))
                .map(|s| (c, s))
        })
        .collect();
    if !suggestions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Description", "Amount", "Category", "Suggested"]);
        for (c, suggested) in suggestions {
            table.add_row(vec![
                Cell::new(&c.description),
                Cell::new(money(c.amount)),
                Cell::new(&c.category),
                Cell::new(suggested.yellow()),
            ]);
        }
        println!("\nCategory Suggestions\n{table}");
    }

    if let Some(confidence) = insights.confidence {
        // agents report either a 0..1 fraction or a percentage
        let pct = if confidence <= 1.0 { confidence * 100.0 } else { confidence };
        println!("\n{}", format!("Confidence: {pct:.0}%").dimmed());
    }
}
