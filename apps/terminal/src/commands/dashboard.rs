//! # Dashboard Commands
//!
//! Sales figures for a day, week, month or year.

use chrono::{Local, NaiveDate};
use tracing::debug;

use comanda_core::{SalesSummary, SummaryPeriod, SummaryQuery};

use crate::error::AppResult;
use crate::state::SessionState;

/// Summary of the period containing `date` (today when omitted).
pub async fn get_summary(
    session: &SessionState,
    period: SummaryPeriod,
    date: Option<NaiveDate>,
) -> AppResult<SalesSummary> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    debug!(period = period.as_str(), %date, "get_summary command");

    let store_id = session.store_id()?;
    Ok(session
        .repos()
        .summary(&store_id)
        .get(SummaryQuery { period, date })
        .await?)
}
