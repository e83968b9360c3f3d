use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod player;
pub mod score;
pub mod session;
pub mod sse;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn rounds_to_rows<const N: usize>(rounds: &[[u8; N]]) -> Vec<Vec<u8>> {
    rounds.iter().map(|round| round.to_vec()).collect()
}
