//! Utility functions for identifier minting and checkout arithmetic

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique opaque id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Mint a fresh cart identifier.
pub fn mint_cart_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("cart_")
}

/// Order total in minor units. VAT rate is expressed in basis points so the
/// arithmetic stays in integers.
pub fn calculate_total(subtotal: u64, shipping_fee: u64, vat_rate_bps: u64) -> u64 {
    subtotal + subtotal * vat_rate_bps / 10_000 + shipping_fee
}

/// Format minor units as a display price, e.g. `$12.99`.
pub fn format_price(minor_units: u64, currency: &str) -> String {
    let symbol = match currency {
        "EUR" => "€",
        "GBP" => "£",
        _ => "$",
    };
    format!("{symbol}{}.{:02}", minor_units / 100, minor_units % 100)
}
