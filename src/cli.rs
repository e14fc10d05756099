use std::fmt::Write as _;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::ServerArgs;
use crate::core::{
    BudgetOutcome, BudgetSession, IncomeInput, LedgerEntry, ProjectionHorizon, parse_start_balance,
};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(
    name = "budget",
    version,
    about = "Monthly budget calculator: UK take-home pay, recurring costs and balance projection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP JSON API.
    Serve(ServerArgs),
    /// Calculate a budget once and print it.
    Calc(CalcArgs),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LedgerItem {
    pub name: String,
    pub amount: f64,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    #[arg(long, conflicts_with = "annual_salary", help = "Hourly wage")]
    pub hourly_rate: Option<f64>,
    #[arg(long, help = "Contracted hours per week, used with --hourly-rate")]
    pub hours_per_week: Option<f64>,
    #[arg(long, help = "Gross annual salary")]
    pub annual_salary: Option<f64>,
    #[arg(long, help = "Skip the income tax and National Insurance estimate")]
    pub no_tax: bool,
    #[arg(
        long = "subscription",
        value_name = "NAME=AMOUNT",
        value_parser = parse_ledger_item,
        help = "Monthly subscription; repeatable"
    )]
    pub subscriptions: Vec<LedgerItem>,
    #[arg(
        long = "annual-cost",
        value_name = "NAME=AMOUNT",
        value_parser = parse_ledger_item,
        help = "Yearly cost, budgeted as a twelfth per month; repeatable"
    )]
    pub annual_costs: Vec<LedgerItem>,
    #[arg(
        long,
        default_value = "0",
        allow_hyphen_values = true,
        help = "Current balance; negative or non-numeric values count as 0"
    )]
    pub balance: String,
    #[arg(
        long,
        default_value = "3",
        value_parser = parse_horizon,
        help = "Projection horizon in months: 1, 3, 6, 12, 24 or 36"
    )]
    pub horizon: ProjectionHorizon,
    #[arg(long, help = "Print JSON instead of a text report")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CalcReport<'a> {
    subscriptions: &'a [LedgerEntry],
    annual_costs: &'a [LedgerEntry],
    rejected_items: usize,
    outcome: &'a BudgetOutcome,
}

fn parse_ledger_item(raw: &str) -> std::result::Result<LedgerItem, String> {
    let Some((name, amount)) = raw.rsplit_once('=') else {
        return Err(format!("expected NAME=AMOUNT, got '{raw}'"));
    };
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount in '{raw}': {e}"))?;
    Ok(LedgerItem {
        name: name.trim().to_string(),
        amount,
    })
}

fn parse_horizon(raw: &str) -> std::result::Result<ProjectionHorizon, String> {
    let months = raw
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid horizon '{raw}': {e}"))?;
    ProjectionHorizon::from_months(months)
        .ok_or_else(|| format!("unsupported horizon of {months} months"))
}

fn income_from_args(args: &CalcArgs) -> Option<IncomeInput> {
    if let Some(rate) = args.hourly_rate {
        return Some(IncomeInput::Hourly {
            rate,
            hours_per_week: args.hours_per_week.unwrap_or(0.0),
        });
    }
    args.annual_salary
        .map(|amount| IncomeInput::Annual { amount })
}

/// Builds a session from the arguments and renders its outcome.
pub fn run_calc(args: &CalcArgs) -> Result<String> {
    let mut session = BudgetSession::new();
    session.set_tax_enabled(!args.no_tax);
    if let Some(income) = income_from_args(args) {
        session.set_income(income);
    }
    session.set_start_balance(parse_start_balance(&args.balance));
    session.set_horizon(args.horizon);

    let mut rejected_items = 0;
    for item in &args.subscriptions {
        if session.add_subscription(&item.name, item.amount).is_none() {
            rejected_items += 1;
        }
    }
    for item in &args.annual_costs {
        if session.add_annual_cost(&item.name, item.amount).is_none() {
            rejected_items += 1;
        }
    }

    if args.json {
        let report = CalcReport {
            subscriptions: session.subscriptions().entries(),
            annual_costs: session.annual_costs().entries(),
            rejected_items,
            outcome: session.outcome(),
        };
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        return Ok(json);
    }
    Ok(render_text(&session, rejected_items))
}

fn render_text(session: &BudgetSession, rejected_items: usize) -> String {
    let mut out = String::new();
    let outcome = session.outcome();

    let Some(summary) = outcome.summary else {
        out.push_str("No income entered: provide a positive --hourly-rate with --hours-per-week, or --annual-salary.\n");
        return out;
    };
    let calc = summary.calculation;

    let _ = writeln!(
        out,
        "Gross income:   {} / year, {} / month",
        format_gbp(calc.gross_annual),
        format_gbp(calc.gross_monthly)
    );
    if calc.tax_enabled {
        let _ = writeln!(out, "Tax + NI:       {} / month", format_gbp(calc.monthly_tax));
    } else {
        let _ = writeln!(out, "Tax + NI:       not estimated");
    }
    let _ = writeln!(out, "Net income:     {} / month", format_gbp(calc.net_monthly));
    let _ = writeln!(
        out,
        "Subscriptions:  {} / month ({} items)",
        format_gbp(summary.subscriptions_monthly),
        session.subscriptions().len()
    );
    let _ = writeln!(
        out,
        "Annual costs:   {} / month ({} / year, {} items)",
        format_gbp(summary.annual_costs_monthly),
        format_gbp(session.annual_costs().total()),
        session.annual_costs().len()
    );
    let _ = writeln!(
        out,
        "Disposable:     {} / month",
        format_gbp(summary.disposable_monthly)
    );
    if rejected_items > 0 {
        let _ = writeln!(out, "Skipped {rejected_items} invalid cost entries");
    }

    let _ = writeln!(
        out,
        "\nProjection over {} months from {}:",
        session.horizon().months(),
        format_gbp(session.start_balance())
    );
    for point in &outcome.projection {
        let _ = writeln!(out, "  Month {:>2}  {}", point.month, format_gbp(point.balance));
    }
    out
}

/// Formats pounds with thousands separators, e.g. `-£1,234.50`.
pub fn format_gbp(value: f64) -> String {
    let pennies = (value * 100.0).round() as i64;
    let sign = if pennies < 0 { "-" } else { "" };
    let pennies = pennies.unsigned_abs();
    let pounds = (pennies / 100).to_string();

    let mut grouped = String::with_capacity(pounds.len() + pounds.len() / 3);
    for (idx, ch) in pounds.chars().enumerate() {
        if idx > 0 && (pounds.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}£{grouped}.{:02}", pennies % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_calc(args: &[&str]) -> CalcArgs {
        let cli = Cli::try_parse_from(
            ["budget", "calc"].into_iter().chain(args.iter().copied()),
        )
        .expect("valid args");
        match cli.command {
            Command::Calc(args) => args,
            Command::Serve(_) => panic!("expected calc command"),
        }
    }

    #[test]
    fn formats_pounds_with_separators() {
        assert_eq!(format_gbp(0.0), "£0.00");
        assert_eq!(format_gbp(1_234.5), "£1,234.50");
        assert_eq!(format_gbp(1_000_000.0), "£1,000,000.00");
        assert_eq!(format_gbp(-100.0), "-£100.00");
        assert_eq!(format_gbp(999.999), "£1,000.00");
    }

    #[test]
    fn parses_ledger_items() {
        assert_eq!(
            parse_ledger_item("Netflix=9.99"),
            Ok(LedgerItem {
                name: "Netflix".to_string(),
                amount: 9.99
            })
        );
        assert_eq!(
            parse_ledger_item("Car = Tax=120").map(|item| item.name),
            Ok("Car = Tax".to_string())
        );
        assert!(parse_ledger_item("Netflix").is_err());
        assert!(parse_ledger_item("Netflix=abc").is_err());
    }

    #[test]
    fn horizon_must_be_an_offered_choice() {
        assert_eq!(parse_horizon("12"), Ok(ProjectionHorizon::OneYear));
        assert!(parse_horizon("5").is_err());
        assert!(Cli::try_parse_from(["budget", "calc", "--horizon", "7"]).is_err());
    }

    #[test]
    fn hourly_and_annual_income_conflict() {
        assert!(
            Cli::try_parse_from([
                "budget",
                "calc",
                "--hourly-rate",
                "20",
                "--annual-salary",
                "30000"
            ])
            .is_err()
        );
    }

    #[test]
    fn text_report_lists_projection() {
        let args = parse_calc(&[
            "--annual-salary",
            "24000",
            "--no-tax",
            "--subscription",
            "Phone=20",
            "--annual-cost",
            "Insurance=600",
            "--balance",
            "1000",
        ]);
        let report = run_calc(&args).expect("report");
        assert!(report.contains("Disposable:     £1,930.00 / month"));
        assert!(report.contains("Tax + NI:       not estimated"));
        assert!(report.contains("Month  3  £6,790.00"));
    }

    #[test]
    fn missing_income_reports_no_data() {
        let args = parse_calc(&["--hourly-rate", "20", "--subscription", "Gym=30"]);
        let report = run_calc(&args).expect("report");
        assert!(report.starts_with("No income entered"));
    }

    #[test]
    fn negative_balance_counts_as_zero() {
        let args = parse_calc(&["--annual-salary", "12000", "--no-tax", "--balance", "-50"]);
        let report = run_calc(&args).expect("report");
        assert!(report.contains("from £0.00"));
    }

    #[test]
    fn json_report_counts_rejected_items() {
        let args = parse_calc(&[
            "--annual-salary",
            "36000",
            "--subscription",
            "Free=0",
            "--json",
        ]);
        let json = run_calc(&args).expect("report");
        assert!(json.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&json).expect("json report");
        assert_eq!(value["rejected_items"], 1);
        assert_eq!(value["outcome"]["projection"].as_array().map(Vec::len), Some(4));
        assert!(value["outcome"]["summary"]["disposable_monthly"].is_number());
    }
}
