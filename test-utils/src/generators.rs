//! Shared proptest generators.

use proptest::prelude::*;

/// Arbitrary auth-type selections, valid and invalid characters mixed.
pub fn auth_type_input_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,16}"
}

/// Plausible service provider names.
pub fn service_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}(\\.[a-z]{2,6}){1,2}"
}

/// Tickets as `(service name, ticket)` pairs.
pub fn ticket_strategy() -> impl Strategy<Value = (String, String)> {
    (service_name_strategy(), "[A-Za-z0-9@]{8,32}")
        .prop_map(|(name, token)| {
            let ticket = format!("{name}:{token}");
            (name, ticket)
        })
}

/// Tickets missing the `:` separator.
pub fn malformed_ticket_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.@-]{0,32}"
}

/// Text parameter values, empty about a quarter of the time.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        3 => "\\PC{1,24}",
    ]
}

/// Binary parameter values, including the empty value.
pub fn bytes_value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..32)
}

/// Lock timeouts and TTLs in seconds, zero included.
pub fn seconds_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0_u64), 1_u64..86_400]
}

/// Number of consecutive transport failures to inject.
pub fn failure_count_strategy() -> impl Strategy<Value = u32> {
    0_u32..6
}
