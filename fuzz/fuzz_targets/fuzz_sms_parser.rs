//! Fuzz target: `sms::interpret` and `sms::parse_notification`
//!
//! Feeds arbitrary receive-buffer contents to both parsers.  Neither may
//! panic, and any provisioned number must itself be a valid owner number.
//!
//! cargo fuzz run fuzz_sms_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use solmate::modem::sms::{self, MAX_INDEX_DIGITS, SmsIntent, SmsVocabulary};
use solmate::phone::PhoneNumber;

const VOCAB: SmsVocabulary<'static> = SmsVocabulary {
    secret: "978SolMate",
    status_phrase: "What's up",
};

fuzz_target!(|data: &[u8]| {
    if let Ok(index) = sms::parse_notification(data) {
        assert!(index < 10u32.pow(MAX_INDEX_DIGITS as u32));
    }

    if let SmsIntent::Provision(number) = sms::interpret(data, &VOCAB) {
        assert_eq!(PhoneNumber::parse(number.as_str()).as_ref(), Ok(&number));
    }
});
