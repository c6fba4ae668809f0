//! Read-only aggregate reports over a cleaned collection.
//!
//! Nothing here mutates rows. Rows without the value an aggregate needs
//! (a null `total_laid_off`, an uncoerced date, a null industry) are skipped
//! by that aggregate only. Sums saturate at `i64::MAX` instead of overflowing.
//!
//! ```text
//! RowCollection ──┬──▶ summary
//!                 ├──▶ fully_shut_down
//!                 ├──▶ totals_by(Dimension)
//!                 ├──▶ rolling_monthly
//!                 ├──▶ top_companies_per_year
//!                 └──▶ funding_vs_percentage
//! ```

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Row, RowCollection};

/// Default N for [`top_companies_per_year`].
pub const DEFAULT_TOP_N: usize = 5;

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub rows: usize,
    pub total_laid_off: i64,
    pub max_total_laid_off: Option<i64>,
    pub max_percentage_laid_off: Option<f64>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

pub fn summary(rows: &RowCollection) -> Summary {
    let max_percentage_laid_off = rows
        .iter()
        .filter_map(|r| r.percentage_laid_off)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    Summary {
        rows: rows.len(),
        total_laid_off: rows
            .iter()
            .filter_map(|r| r.total_laid_off)
            .fold(0, i64::saturating_add),
        max_total_laid_off: rows.iter().filter_map(|r| r.total_laid_off).max(),
        max_percentage_laid_off,
        earliest: rows.iter().filter_map(Row::date).min(),
        latest: rows.iter().filter_map(Row::date).max(),
    }
}

// =============================================================================
// Shut-downs
// =============================================================================

/// A company that laid off its whole workforce.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShutDown {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub date: Option<NaiveDate>,
    pub funds_raised_millions: Option<f64>,
}

/// Rows with `percentage_laid_off == 1`, most funded first (unknown funding last).
pub fn fully_shut_down(rows: &RowCollection) -> Vec<ShutDown> {
    let mut out: Vec<ShutDown> = rows
        .iter()
        .filter(|r| r.percentage_laid_off == Some(1.0))
        .map(|r| ShutDown {
            company: r.company.clone(),
            location: r.location.clone(),
            industry: r.industry.clone(),
            total_laid_off: r.total_laid_off,
            date: r.date(),
            funds_raised_millions: r.funds_raised_millions,
        })
        .collect();

    out.sort_by(|a, b| match (a.funds_raised_millions, b.funds_raised_millions) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}

// =============================================================================
// Grouped totals
// =============================================================================

/// Grouping key for [`totals_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Company,
    Industry,
    Country,
    Stage,
    Location,
    Year,
    /// `YYYY-MM`
    Month,
}

impl Dimension {
    fn key(self, row: &Row) -> Option<String> {
        match self {
            Dimension::Company => Some(row.company.clone()),
            Dimension::Industry => row.industry.clone(),
            Dimension::Country => Some(row.country.clone()),
            Dimension::Stage => Some(row.stage.clone()),
            Dimension::Location => Some(row.location.clone()),
            Dimension::Year => row.date().map(|d| d.year().to_string()),
            Dimension::Month => row.date().map(month_key),
        }
    }
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    pub key: String,
    pub total_laid_off: i64,
}

/// Sum of `total_laid_off` per group, largest first (ties by key).
pub fn totals_by(rows: &RowCollection, dimension: Dimension) -> Vec<GroupTotal> {
    let mut sums: HashMap<String, i64> = HashMap::new();
    for row in rows {
        let (Some(key), Some(total)) = (dimension.key(row), row.total_laid_off) else {
            continue;
        };
        let sum = sums.entry(key).or_default();
        *sum = sum.saturating_add(total);
    }

    let mut out: Vec<GroupTotal> = sums
        .into_iter()
        .map(|(key, total_laid_off)| GroupTotal { key, total_laid_off })
        .collect();
    out.sort_by(|a, b| {
        b.total_laid_off
            .cmp(&a.total_laid_off)
            .then_with(|| a.key.cmp(&b.key))
    });
    out
}

// =============================================================================
// Rolling monthly total
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: String,
    pub total_laid_off: i64,
    pub rolling_total: i64,
}

/// Monthly totals in ascending month order with a running sum.
pub fn rolling_monthly(rows: &RowCollection) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<String, i64> = BTreeMap::new();
    for row in rows {
        if let (Some(date), Some(total)) = (row.date(), row.total_laid_off) {
            let sum = months.entry(month_key(date)).or_default();
            *sum = sum.saturating_add(total);
        }
    }

    let mut rolling: i64 = 0;
    months
        .into_iter()
        .map(|(month, total_laid_off)| {
            rolling = rolling.saturating_add(total_laid_off);
            MonthlyTotal { month, total_laid_off, rolling_total: rolling }
        })
        .collect()
}

// =============================================================================
// Top companies per year
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedCompany {
    pub year: i32,
    pub company: String,
    pub total_laid_off: i64,
    /// Dense rank within the year, starting at 1
    pub rank: usize,
}

/// Companies ranked by yearly total with dense ranking; every company whose
/// rank is at most `n` is kept, so ties can yield more than `n` entries.
pub fn top_companies_per_year(rows: &RowCollection, n: usize) -> Vec<RankedCompany> {
    let mut years: BTreeMap<i32, HashMap<&str, i64>> = BTreeMap::new();
    for row in rows {
        if let (Some(date), Some(total)) = (row.date(), row.total_laid_off) {
            let sum = years
                .entry(date.year())
                .or_default()
                .entry(row.company.as_str())
                .or_default();
            *sum = sum.saturating_add(total);
        }
    }

    let mut out = Vec::new();
    for (year, companies) in years {
        let mut ranked: Vec<(&str, i64)> = companies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut rank = 0;
        let mut previous = None;
        for (company, total) in ranked {
            if previous != Some(total) {
                rank += 1;
                previous = Some(total);
            }
            if rank > n {
                break;
            }
            out.push(RankedCompany {
                year,
                company: company.to_string(),
                total_laid_off: total,
                rank,
            });
        }
    }
    out
}

// =============================================================================
// Correlation
// =============================================================================

/// Pearson correlation between funds raised and percentage laid off over
/// rows that carry both. `None` with fewer than two pairs or zero variance.
pub fn funding_vs_percentage(rows: &RowCollection) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.funds_raised_millions?, r.percentage_laid_off?)))
        .collect();
    pearson(&pairs)
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        None
    } else {
        Some(cov / denom)
    }
}

// =============================================================================
// Full report
// =============================================================================

/// Every report at once, as returned by the CLI `report` command and the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub fully_shut_down: Vec<ShutDown>,
    pub by_company: Vec<GroupTotal>,
    pub by_industry: Vec<GroupTotal>,
    pub by_country: Vec<GroupTotal>,
    pub by_stage: Vec<GroupTotal>,
    pub by_year: Vec<GroupTotal>,
    pub rolling_monthly: Vec<MonthlyTotal>,
    pub top_companies_per_year: Vec<RankedCompany>,
    pub funding_vs_percentage: Option<f64>,
}

impl Report {
    pub fn build(rows: &RowCollection, top_n: usize) -> Self {
        Self {
            summary: summary(rows),
            fully_shut_down: fully_shut_down(rows),
            by_company: totals_by(rows, Dimension::Company),
            by_industry: totals_by(rows, Dimension::Industry),
            by_country: totals_by(rows, Dimension::Country),
            by_stage: totals_by(rows, Dimension::Stage),
            by_year: totals_by(rows, Dimension::Year),
            rolling_monthly: rolling_monthly(rows),
            top_companies_per_year: top_companies_per_year(rows, top_n),
            funding_vs_percentage: funding_vs_percentage(rows),
        }
    }
}
