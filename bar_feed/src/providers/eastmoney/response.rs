use serde::Deserialize;

use crate::normalize::RawTable;

/// Column labels of the kline payload, in wire order. The endpoint returns
/// each bar as one comma-joined string: time, open, close, high, low, volume.
pub const COLUMNS: [&str; 6] = ["time", "open", "close", "high", "low", "volume"];

#[derive(Deserialize, Debug)]
pub struct KlineResponse {
    /// Absent when the symbol is unknown or the window holds no sessions.
    pub data: Option<KlineData>,
}

#[derive(Deserialize, Debug)]
pub struct KlineData {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub klines: Vec<String>,
}

/// Explode the comma-joined kline strings into an uninterpreted [`RawTable`].
///
/// A missing `data` object becomes an empty table; the fetch task treats
/// empties as their own outcome, so no error is raised here.
pub fn to_raw_table(data: Option<KlineData>) -> RawTable {
    let columns = COLUMNS.iter().map(|s| s.to_string()).collect();
    let rows = data
        .map(|d| {
            d.klines
                .iter()
                .map(|line| line.split(',').map(str::to_string).collect())
                .collect()
        })
        .unwrap_or_default();
    RawTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "rc": 0,
        "data": {
            "code": "000300",
            "name": "沪深300",
            "klines": [
                "2024-01-10 09:35,3420.10,3421.00,3422.50,3419.00,123456",
                "2024-01-10 09:40,3421.00,3423.50,3424.00,3420.50,98765"
            ]
        }
    }"#;

    #[test]
    fn parses_kline_payload_into_rows() {
        let response: KlineResponse = serde_json::from_str(BODY).unwrap();
        let table = to_raw_table(response.data);
        assert_eq!(table.columns, COLUMNS);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "2024-01-10 09:35");
        assert_eq!(table.rows[0][5], "123456");
    }

    #[test]
    fn missing_data_object_is_an_empty_table() {
        let response: KlineResponse = serde_json::from_str(r#"{"rc": 0, "data": null}"#).unwrap();
        let table = to_raw_table(response.data);
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 6);
    }
}
