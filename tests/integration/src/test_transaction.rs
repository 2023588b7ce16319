//! Cancellation reasons of failed transactions.

#[cfg(test)]
mod tests {
    use dynashape_core::{CancellationReason, parse_cancellation_reasons};

    #[test]
    fn test_should_map_reasons_to_transaction_items() {
        let message = "Transaction cancelled, please refer cancellation reasons for specific \
                       reasons [None, ConditionalCheckFailed, ValidationError]";
        let reasons = parse_cancellation_reasons(message);
        let failed: Vec<usize> = reasons
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_failure())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(reasons[2], CancellationReason::ValidationError);
    }
}
