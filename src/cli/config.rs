//! The `config` command: view or change display and budget settings.

use crate::cli::args::ConfigArgs;
use crate::core::currency;
use crate::error::{CloudSightError, Result};

/// Execute the config command.
pub async fn execute(args: &ConfigArgs) -> Result<()> {
    let store = crate::cli::open_store();

    if args.currency.is_none() && args.budget.is_none() && args.warn_pct.is_none() {
        let state = store.load().await?;
        println!("currency:  {}", state.currency);
        println!("budget:    ${:.2}", state.budget_limit);
        println!("warn-pct:  {:.0}%", state.budget_warn_pct);
        return Ok(());
    }

    let currency_code = match &args.currency {
        Some(code) => {
            let upper = code.to_uppercase();
            if !currency::is_supported(&upper) {
                return Err(CloudSightError::ConfigInvalid {
                    key: "currency".to_string(),
                    message: format!("unsupported currency code {code}"),
                });
            }
            Some(upper)
        }
        None => None,
    };

    if let Some(budget) = args.budget {
        if budget <= 0.0 || !budget.is_finite() {
            return Err(CloudSightError::ConfigInvalid {
                key: "budget".to_string(),
                message: "budget must be a positive amount".to_string(),
            });
        }
    }
    if let Some(warn_pct) = args.warn_pct {
        if !(warn_pct > 0.0 && warn_pct < 100.0) {
            return Err(CloudSightError::ConfigInvalid {
                key: "warnPct".to_string(),
                message: "warning threshold must be between 0 and 100".to_string(),
            });
        }
    }

    let state = store
        .update(|state| {
            if let Some(code) = currency_code {
                state.currency = code;
            }
            if let Some(budget) = args.budget {
                state.budget_limit = budget;
            }
            if let Some(warn_pct) = args.warn_pct {
                state.budget_warn_pct = warn_pct;
            }
        })
        .await?;

    println!(
        "Settings updated: currency {} / budget ${:.2} / warn {:.0}%",
        state.currency, state.budget_limit, state.budget_warn_pct
    );
    Ok(())
}
