use chrono_tz::Asia::Shanghai;

use crate::models::request::BarsRequest;
use crate::providers::ProviderError;

/// Market prefix for the `secid` query parameter.
///
/// CSI/SSE index codes (`000xxx`) and SSE equities (`6xxxxx`) live on
/// market 1; SZSE indexes (`399xxx`) and equities (`0xxxxx`/`3xxxxx`) on
/// market 0. Codes like `000001` are ambiguous between the SSE composite
/// index and a SZSE equity; this tool charts indexes, so the index reading
/// wins.
fn market_prefix(symbol: &str) -> &'static str {
    if symbol.starts_with("000") || symbol.starts_with('6') {
        "1"
    } else {
        "0"
    }
}

/// Reject symbols the kline endpoint cannot address.
pub fn validate_symbol(symbol: &str) -> Result<(), ProviderError> {
    if symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ProviderError::Validation(format!(
            "symbol must be six digits, got {symbol:?}"
        )))
    }
}

/// Build the query string pairs for one bars request.
///
/// The endpoint takes exchange-local calendar dates, so the UTC request
/// bounds are converted back to Shanghai wall-clock before formatting.
pub fn construct_params(request: &BarsRequest) -> Vec<(String, String)> {
    let beg = request.start.with_timezone(&Shanghai).format("%Y%m%d");
    let end = request.end.with_timezone(&Shanghai).format("%Y%m%d");
    vec![
        (
            "secid".to_string(),
            format!("{}.{}", market_prefix(&request.symbol), request.symbol),
        ),
        ("klt".to_string(), request.period.kline_code().to_string()),
        // Forward-adjusted prices.
        ("fqt".to_string(), "1".to_string()),
        ("beg".to_string(), beg.to_string()),
        ("end".to_string(), end.to_string()),
        ("fields1".to_string(), "f1,f2,f3,f4,f5".to_string()),
        (
            "fields2".to_string(),
            "f51,f52,f53,f54,f55,f56".to_string(),
        ),
    ]
}
