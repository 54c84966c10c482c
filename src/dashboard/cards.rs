//! Card components for the headline numbers of the dashboard.
//!
//! Shows the current month's income, expenses and balance next to the
//! balance over all entries.

use maud::{Markup, html};

use crate::{html::format_currency, ledger::LedgerSummary};

/// How a card's amount should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Income,
    Expense,
    /// Green when zero or above, red below zero.
    Balance,
}

impl Tone {
    fn amount_class(self, amount: f64) -> &'static str {
        match self {
            Tone::Income => "text-green-600 dark:text-green-400",
            Tone::Expense => "text-red-600 dark:text-red-400",
            Tone::Balance if amount < 0.0 => "text-red-600 dark:text-red-400",
            Tone::Balance => "text-gray-900 dark:text-white",
        }
    }
}

fn summary_card(title: &str, subtitle: &str, amount: f64, tone: Tone) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                   dark:border-gray-700 rounded-lg p-4 shadow-md"
            aria-label=(format!("{title}: {}", format_currency(amount)))
        {
            h4 class="text-sm font-semibold text-gray-600 dark:text-gray-400" { (title) }

            div class={ "text-3xl font-bold mt-1 tabular-nums " (tone.amount_class(amount)) }
            {
                (format_currency(amount))
            }

            div class="text-xs text-gray-500 dark:text-gray-400 mt-1" { (subtitle) }
        }
    }
}

/// Renders the grid of summary cards.
pub(super) fn summary_cards_view(summary: &LedgerSummary) -> Markup {
    html! {
        section id="summary-cards" class="w-full mx-auto mt-4 mb-8"
        {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4"
            {
                (summary_card("Income", "This month", summary.month_income, Tone::Income))
                (summary_card("Expenses", "This month", summary.month_expense, Tone::Expense))
                (summary_card("Balance", "This month", summary.month_balance, Tone::Balance))
                (summary_card(
                    "Overall Balance",
                    "All entries",
                    summary.overall_balance,
                    Tone::Balance
                ))
            }
        }
    }
}
