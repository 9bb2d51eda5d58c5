use crate::error::OrderFormError;

/// Locate a column whose header contains every keyword.
///
/// The ledger's facility quantity columns carry long compound headers that
/// drift between exports, so they are found by keyword match rather than by
/// exact name. Returns the index of the first matching header. The error
/// reports the attempted keywords and the full header list, since a missing
/// column is the dominant operator-facing failure mode.
pub fn resolve_column(headers: &[String], keywords: &[&str]) -> Result<usize, OrderFormError> {
    headers
        .iter()
        .position(|header| keywords.iter().all(|keyword| header.contains(keyword)))
        .ok_or_else(|| OrderFormError::ColumnNotFound {
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            available: headers.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn finds_first_header_containing_all_keywords() {
        let headers = headers(&[
            "使用日",
            "介護老人福祉施設いわと 入所者数",
            "介護老人福祉施設いわと 職員数",
        ]);
        assert_eq!(
            resolve_column(&headers, &["介護老人福祉施設いわと", "入所者"]).unwrap(),
            1
        );
        assert_eq!(
            resolve_column(&headers, &["介護老人福祉施設いわと", "職員"]).unwrap(),
            2
        );
    }

    #[test]
    fn missing_column_reports_keywords_and_headers() {
        let headers = headers(&["使用日", "食品名"]);
        let err = resolve_column(&headers, &["ケアハウス", "入所者"]).unwrap_err();
        match err {
            OrderFormError::ColumnNotFound {
                keywords,
                available,
            } => {
                assert_eq!(keywords, vec!["ケアハウス", "入所者"]);
                assert_eq!(available, vec!["使用日", "食品名"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
