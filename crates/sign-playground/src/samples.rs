//! Default payloads used to seed the editors.

use serde_json::{Value, json};

/// Default message for `personal_sign`.
pub const DEFAULT_MESSAGE: &str = "Hello, wallet! Please sign this message.";

fn mail_types() -> Value {
    json!({
        "EIP712Domain": [
            { "name": "name", "type": "string" },
            { "name": "version", "type": "string" },
            { "name": "chainId", "type": "uint256" },
            { "name": "verifyingContract", "type": "address" }
        ],
        "Person": [
            { "name": "name", "type": "string" },
            { "name": "wallet", "type": "address" }
        ],
        "Mail": [
            { "name": "from", "type": "Person" },
            { "name": "to", "type": "Person" },
            { "name": "contents", "type": "string" }
        ]
    })
}

fn mail_domain() -> Value {
    json!({
        "name": "Ether Mail",
        "version": "1",
        "chainId": 1,
        "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
    })
}

fn mail(from: &str, to: &str, contents: &str) -> Value {
    json!({
        "types": mail_types(),
        "primaryType": "Mail",
        "domain": mail_domain(),
        "message": {
            "from": { "name": from, "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
            "to": { "name": to, "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
            "contents": contents
        }
    })
}

/// The EIP-712 "Ether Mail" example, signed with `eth_signTypedData_v4`.
pub fn typed_data_v4() -> Value {
    mail("Alice", "Bob", "Hello, Bob!")
}

/// Same schema as [`typed_data_v4`] with a different message, signed with `eth_signTypedData_v3`.
pub fn typed_data_v3() -> Value {
    mail("Charlie", "Dave", "Hello from V3!")
}

/// Legacy typed data: an ordered list of typed fields, signed with `eth_signTypedData`.
pub fn typed_data_legacy() -> Value {
    json!([
        { "type": "string", "name": "Message", "value": "Hi, Alice!" },
        { "type": "uint32", "name": "A number", "value": "1337" }
    ])
}

/// Serializes a payload the way the editors display it: two-space indentation, keys in
/// insertion order.
pub fn to_editor_text(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
