/// Maps provider card-rejection codes to renter-facing messages. Unknown
/// codes fall back to a generic message instead of leaking the raw code.
pub fn rejection_message(status_detail: &str) -> &'static str {
    match status_detail {
        "cc_rejected_insufficient_amount" => "The card has insufficient funds",
        "cc_rejected_bad_filled_card_number" => "Check the card number",
        "cc_rejected_bad_filled_date" => "Check the card expiration date",
        "cc_rejected_bad_filled_security_code" => "Check the card security code",
        "cc_rejected_bad_filled_other" => "Check the card details",
        "cc_rejected_call_for_authorize" => "The card issuer requires a phone authorization",
        "cc_rejected_card_disabled" => "The card is disabled, contact the issuer",
        "cc_rejected_duplicated_payment" => "A payment for the same amount was already made",
        "cc_rejected_high_risk" => "The payment was declined by risk controls",
        "cc_rejected_invalid_installments" => "The card does not support this installment plan",
        "cc_rejected_max_attempts" => "Attempt limit reached, try another card",
        "cc_rejected_blacklist" => "The payment could not be processed",
        "cc_rejected_other_reason" => "The card issuer declined the payment",
        _ => "The payment was declined, try another payment method",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_specific_messages() {
        assert_eq!(
            rejection_message("cc_rejected_insufficient_amount"),
            "The card has insufficient funds"
        );
        assert_eq!(
            rejection_message("cc_rejected_max_attempts"),
            "Attempt limit reached, try another card"
        );
    }

    #[test]
    fn unknown_codes_fall_back_to_generic_message() {
        assert_eq!(
            rejection_message("cc_rejected_some_future_code"),
            "The payment was declined, try another payment method"
        );
    }
}
