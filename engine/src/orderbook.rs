//! The binary order-book wire format and its JSON transcoding (spec.md §4.1,
//! §6.1 "Binary order-book response").
//!
//! Layout: a run of bid records followed by a run of ask records. Each
//! record is 8 bytes: big-endian `u32` quantity, big-endian `u32` price. A
//! record with `qty == 0` terminates the current section (its price field
//! is still present on the wire and is discarded).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: u32,
    pub qty: u32,
    #[serde(rename = "isBuy")]
    pub is_buy: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub ok: bool,
    pub venue: String,
    pub symbol: String,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub ts: String,
}

impl OrderBookSnapshot {
    #[must_use]
    pub fn new(venue: &str, symbol: &str, bids: Vec<OrderBookLevel>, asks: Vec<OrderBookLevel>) -> Self {
        Self {
            ok: true,
            venue: venue.to_owned(),
            symbol: symbol.to_owned(),
            bids,
            asks,
            ts: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        }
    }

    /// Re-encodes `bids`/`asks` into the original binary wire format
    /// (invariant 4, spec.md §8: round-trips through [`decode_binary`]).
    #[must_use]
    pub fn encode_binary(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.bids.len() + self.asks.len() + 2) * 8);
        for level in &self.bids {
            out.extend_from_slice(&level.qty.to_be_bytes());
            out.extend_from_slice(&level.price.to_be_bytes());
        }
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        for level in &self.asks {
            out.extend_from_slice(&level.qty.to_be_bytes());
            out.extend_from_slice(&level.price.to_be_bytes());
        }
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out
    }
}

/// Streams a binary order-book response from an async reader (the engine's
/// stdout pipe) and decodes it directly into JSON, per spec.md §4.1 ("prefer
/// a streaming decode to avoid double buffering the entire book").
pub async fn decode_binary<R: AsyncRead + Unpin>(
    reader: &mut R,
    venue: &str,
    symbol: &str,
) -> std::io::Result<OrderBookSnapshot> {
    let bids = read_levels(reader, true).await?;
    let asks = read_levels(reader, false).await?;
    Ok(OrderBookSnapshot::new(venue, symbol, bids, asks))
}

async fn read_levels<R: AsyncRead + Unpin>(
    reader: &mut R,
    is_buy: bool,
) -> std::io::Result<Vec<OrderBookLevel>> {
    let mut levels = Vec::new();
    loop {
        let qty = reader.read_u32().await?;
        let price = reader.read_u32().await?;
        if qty == 0 {
            break;
        }
        levels.push(OrderBookLevel { price, qty, is_buy });
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bids_and_asks() {
        let snapshot = OrderBookSnapshot::new(
            "TESTEX",
            "FOOBAR",
            vec![
                OrderBookLevel { price: 100, qty: 5, is_buy: true },
                OrderBookLevel { price: 99, qty: 3, is_buy: true },
            ],
            vec![OrderBookLevel { price: 101, qty: 2, is_buy: false }],
        );

        let wire = snapshot.encode_binary();
        let mut cursor = std::io::Cursor::new(wire);
        let decoded = decode_binary(&mut cursor, "TESTEX", "FOOBAR").await.unwrap();

        assert_eq!(decoded.bids, snapshot.bids);
        assert_eq!(decoded.asks, snapshot.asks);
        assert_eq!(decoded.venue, "TESTEX");
        assert_eq!(decoded.symbol, "FOOBAR");
    }

    #[tokio::test]
    async fn empty_book_decodes_to_empty_vecs() {
        let wire = [0u8; 16]; // bid terminator + ask terminator
        let mut cursor = std::io::Cursor::new(wire);
        let decoded = decode_binary(&mut cursor, "TESTEX", "FOOBAR").await.unwrap();
        assert!(decoded.bids.is_empty());
        assert!(decoded.asks.is_empty());
    }

    #[test]
    fn json_shape_matches_spec() {
        let snapshot = OrderBookSnapshot::new(
            "TESTEX",
            "FOOBAR",
            vec![OrderBookLevel { price: 100, qty: 5, is_buy: true }],
            vec![],
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["bids"][0]["isBuy"], true);
        assert_eq!(value["bids"][0]["price"], 100);
        assert_eq!(value["bids"][0]["qty"], 5);
    }
}
