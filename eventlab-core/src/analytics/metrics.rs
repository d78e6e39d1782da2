//! Return and risk statistics: pure functions over an equity series.
//!
//! Undefined values (zero variance, too few points, non-positive equity)
//! come back as `None` rather than NaN or a panic.

/// Variances below this are treated as zero.
const ZERO_VARIANCE: f64 = 1e-15;

/// Total return as a fraction: final / initial − 1.
pub fn total_return(equity: &[f64]) -> Option<f64> {
    let (first, last) = (*equity.first()?, *equity.last()?);
    if first <= 0.0 {
        return None;
    }
    Some(last / first - 1.0)
}

/// Compound annual growth rate: `(end/start)^(periods_per_year/periods) − 1`,
/// where `periods` is the number of returns in the series.
pub fn cagr(equity: &[f64], periods_per_year: f64) -> Option<f64> {
    if equity.len() < 2 || periods_per_year <= 0.0 {
        return None;
    }
    let (first, last) = (equity[0], equity[equity.len() - 1]);
    if first <= 0.0 || last < 0.0 {
        return None;
    }
    let periods = (equity.len() - 1) as f64;
    Some((last / first).powf(periods_per_year / periods) - 1.0)
}

/// Simple period-over-period returns. A non-positive base yields no return
/// for that period.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Sample standard deviation of returns × sqrt(periods_per_year).
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    Some(std_dev(returns) * periods_per_year.sqrt())
}

/// Annualized Sharpe ratio.
///
/// `(mean(r) − rf/ppy) × ppy / annualized_vol`. `None` with fewer than two
/// returns or zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    let vol = annualized_volatility(returns, periods_per_year)?;
    if vol < ZERO_VARIANCE {
        return None;
    }
    let excess = mean(returns) - risk_free_rate / periods_per_year;
    Some(excess * periods_per_year / vol)
}

/// Annualized Sortino ratio: Sharpe's numerator over downside deviation.
///
/// Downside deviation is `sqrt(Σ min(r − rf/ppy, 0)² / n) × sqrt(ppy)` over
/// all `n` returns. `None` when there are fewer than two returns or no
/// downside at all.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let period_rf = risk_free_rate / periods_per_year;
    let downside_sq: f64 = returns
        .iter()
        .map(|r| r - period_rf)
        .filter(|r| *r < 0.0)
        .map(|r| r * r)
        .sum();
    let downside = (downside_sq / returns.len() as f64).sqrt() * periods_per_year.sqrt();
    if downside < ZERO_VARIANCE {
        return None;
    }
    let excess = mean(returns) - period_rf;
    Some(excess * periods_per_year / downside)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
