//! Sales summary (`get_summary` procedure).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use comanda_core::{SalesSummary, SummaryQuery};

use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Serialize)]
struct SummaryArgs<'a> {
    p_store_id: &'a str,
    p_period: &'a str,
    p_date: String,
}

/// Older deployments wrap the figures in `{ "summary": { .. } }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SummaryResponse {
    Wrapped { summary: SalesSummary },
    Bare(SalesSummary),
}

impl SummaryResponse {
    fn into_summary(self) -> SalesSummary {
        match self {
            SummaryResponse::Wrapped { summary } | SummaryResponse::Bare(summary) => summary,
        }
    }
}

#[derive(Clone)]
pub struct SummaryRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl SummaryRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        SummaryRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    /// Totals and best sellers for the period containing `query.date`.
    pub async fn get(&self, query: SummaryQuery) -> ClientResult<SalesSummary> {
        let date = query.date.format("%Y-%m-%d").to_string();
        let scope = format!("{}:{}", query.period.as_str(), date);
        let key = QueryKey::new(Entity::Summary, &self.store_id, scope);

        self.cache
            .get_or_fetch(key, || async {
                let response: SummaryResponse = self
                    .rest
                    .rpc(
                        "get_summary",
                        &SummaryArgs {
                            p_store_id: &self.store_id,
                            p_period: query.period.as_str(),
                            p_date: date.clone(),
                        },
                    )
                    .await?;
                Ok(response.into_summary())
            })
            .await
    }
}
