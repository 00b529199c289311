//! Client-side credential checks, run before any network effect.

/// Minimum password length accepted at registration and reset.
pub(crate) const MIN_PASSWORD_CHARS: usize = 6;

/// Whether `password` meets the minimum length.
pub(crate) fn password_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

/// Whether `phone` is a 10-digit Indian mobile number (starts 6 to 9).
pub(crate) fn is_indian_mobile(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 10 && matches!(bytes[0], b'6'..=b'9') && bytes.iter().all(u8::is_ascii_digit)
}

/// Whether `otp` is exactly six ASCII digits.
pub(crate) fn is_six_digit_otp(otp: &str) -> bool {
    otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn password_boundary() {
        assert!(!password_long_enough("12345"));
        assert!(password_long_enough("123456"));
        assert!(password_long_enough("पासवर्ड"));
    }

    #[test]
    fn phone_accepts_valid_numbers() {
        assert!(is_indian_mobile("9876543210"));
        assert!(is_indian_mobile("6000000000"));
    }

    #[test]
    fn phone_rejects_bad_shapes() {
        assert!(!is_indian_mobile(""));
        assert!(!is_indian_mobile("987654321"));
        assert!(!is_indian_mobile("98765432101"));
        assert!(!is_indian_mobile("5876543210"));
        assert!(!is_indian_mobile("98765o3210"));
        assert!(!is_indian_mobile("+919876543210"));
    }

    #[test]
    fn otp_rejects_bad_shapes() {
        assert!(is_six_digit_otp("482916"));
        assert!(!is_six_digit_otp("48291"));
        assert!(!is_six_digit_otp("4829167"));
        assert!(!is_six_digit_otp("48291a"));
        assert!(!is_six_digit_otp(""));
    }

    proptest! {
        #[test]
        fn any_valid_mobile_passes(rest in "[0-9]{9}", first in 6u8..=9) {
            let phone = format!("{first}{rest}");
            prop_assert!(is_indian_mobile(&phone));
        }

        #[test]
        fn wrong_length_never_passes(phone in "[0-9]{0,15}") {
            prop_assume!(phone.len() != 10);
            prop_assert!(!is_indian_mobile(&phone));
        }

        #[test]
        fn non_digit_otp_never_passes(otp in "[0-9]{0,3}[a-zA-Z ][0-9a-zA-Z]{0,4}") {
            prop_assert!(!is_six_digit_otp(&otp));
        }

        #[test]
        fn otp_of_six_digits_always_passes(otp in "[0-9]{6}") {
            prop_assert!(is_six_digit_otp(&otp));
        }
    }
}
