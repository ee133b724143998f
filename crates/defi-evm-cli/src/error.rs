//! CLI Output and Error Handling
//!
//! Renders loan results and CLI errors either as coloured terminal text or as
//! timestamped JSON documents on stdout.

use anyhow::Result;
use chrono::prelude::*;
use colored::Colorize;
use serde_json::{json, Value};

use defi_evm_loan::{LoanResult, OutcomeCode};
use defi_evm_networks::shorten;

//-----------------------------------------------------------------------------
// Reporter
//-----------------------------------------------------------------------------

/// Shared output handler for command line operations
#[derive(Debug, Clone, Copy, Default)]
pub struct CliReporter {
    pub verbose: bool,
    pub json: bool,
}

impl CliReporter {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Report an error that stopped the CLI before or outside the workflow.
    pub fn handle_error(&self, error: &anyhow::Error) -> Value {
        let error_obj = json!({
            "success": false,
            "outcome": OutcomeCode::InvalidInput,
            "error": error.to_string(),
            "timestamp": Local::now().to_rfc3339(),
        });

        if self.json {
            println!("{error_obj}");
        } else {
            eprintln!("{} {}", "Error:".red().bold(), error);
            if self.verbose {
                for cause in error.chain().skip(1) {
                    eprintln!("Caused by: {cause}");
                }
            }
        }

        error_obj
    }

    /// Print the result of a loan run and return its JSON form.
    pub fn report_loan(&self, result: &LoanResult) -> Result<Value> {
        let document = loan_document(result)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&document)?);
        } else {
            println!("{}", self.render_loan(result));
        }
        Ok(document)
    }

    /// Human readable form of a loan result
    pub fn render_loan(&self, result: &LoanResult) -> String {
        let mut lines = Vec::new();

        if result.is_success() {
            lines.push(format!("{} {}", "✓".green().bold(), result.message.green()));
        } else {
            lines.push(format!(
                "{} [{}] {}",
                "✗".red().bold(),
                result.outcome.to_string().red().bold(),
                result.message
            ));
            if result.is_partial() {
                lines.push(
                    "On-chain state was partially changed; nothing was rolled back."
                        .yellow()
                        .to_string(),
                );
            }
        }

        if let Some(summary) = &result.summary {
            let account = summary.account.to_string();
            lines.push(format!("  account:          {}", shorten(&account)));
            lines.push(format!("  deposited:        {}", summary.deposited));
            lines.push(format!("  borrowed:         {}", summary.borrowed));
            lines.push(format!("  borrow balance:   {}", summary.borrow_balance));
            if let Some(liquidity) = &summary.remaining_liquidity_usd {
                lines.push(format!("  liquidity (USD):  {liquidity}"));
            }
            lines.push(format!("  transaction:      {}", summary.explorer_link.cyan()));
        } else if let Some(tx_hash) = &result.tx_hash {
            lines.push(format!("  last transaction: {tx_hash}"));
        }

        if self.verbose {
            if let Some(step) = result.last_completed_step {
                lines.push(format!("  last step:        {step}"));
            }
        }

        lines.join("\n")
    }
}

/// JSON document for a loan result
pub fn loan_document(result: &LoanResult) -> Result<Value> {
    Ok(json!({
        "success": result.is_success(),
        "code": result.outcome.code(),
        "timestamp": Local::now().to_rfc3339(),
        "result": serde_json::to_value(result)?,
    }))
}
