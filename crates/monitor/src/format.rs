//! One-line rendering of block snapshots.
//!
//! Colors come from the [`Thresholds`] table only: a value above the
//! `critical` bound is red, above `warning` yellow, above `notable` green.

use crate::aggregator::{BlockSnapshot, RealtimeSnapshot};
use crate::chain::BlockHash;
use nu_ansi_term::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Normal,
    Notable,
    Warning,
    Critical,
}

impl Level {
    fn color(self) -> Option<Color> {
        match self {
            Level::Normal => None,
            Level::Notable => Some(Color::Green),
            Level::Warning => Some(Color::Yellow),
            Level::Critical => Some(Color::Red),
        }
    }
}

/// Lower bounds (exclusive) of each level for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub critical: f64,
    pub warning: f64,
    pub notable: f64,
}

impl Band {
    pub const fn new(critical: f64, warning: f64, notable: f64) -> Self {
        Self {
            critical,
            warning,
            notable,
        }
    }

    pub fn level(&self, value: f64) -> Level {
        if value > self.critical {
            Level::Critical
        } else if value > self.warning {
            Level::Warning
        } else if value > self.notable {
            Level::Notable
        } else {
            Level::Normal
        }
    }
}

/// Color bands of every rendered metric. Amounts are in whole tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub weight_percent: Band,
    pub fees: Band,
    pub extrinsics: Band,
    pub ethereum: Band,
    pub transferred: Band,
    pub pool: Band,
    pub pool_delta: Band,
    pub elapsed_secs: Band,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            weight_percent: Band::new(60.0, 30.0, 10.0),
            fees: Band::new(1.0, 0.1, 0.01),
            extrinsics: Band::new(100.0, 50.0, 20.0),
            ethereum: Band::new(50.0, 20.0, 5.0),
            transferred: Band::new(10_000.0, 1_000.0, 100.0),
            pool: Band::new(1_000.0, 200.0, 50.0),
            pool_delta: Band::new(100.0, 20.0, 5.0),
            elapsed_secs: Band::new(30.0, 18.0, 12.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub prefix: String,
    pub suffix: String,
    /// Decimals of the chain's native token.
    pub decimals: u8,
    /// Render without ANSI color codes.
    pub plain: bool,
    pub thresholds: Thresholds,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            decimals: 18,
            plain: false,
            thresholds: Thresholds::default(),
        }
    }
}

impl FormatOptions {
    fn paint(&self, text: String, level: Level) -> String {
        match level.color() {
            Some(color) if !self.plain => color.paint(text).to_string(),
            _ => text,
        }
    }

    fn tokens(&self, amount: u128) -> f64 {
        amount as f64 / 10f64.powi(i32::from(self.decimals))
    }
}

struct Pool {
    size: usize,
    delta: Option<i64>,
}

/// Render a block snapshot. With a previous snapshot, the time between both
/// blocks is shown as well.
pub fn format_snapshot(
    snapshot: &BlockSnapshot,
    previous: Option<&BlockSnapshot>,
    options: &FormatOptions,
) -> String {
    let elapsed_ms = previous.map(|prev| snapshot.timestamp.saturating_sub(prev.timestamp));
    render(snapshot, None, elapsed_ms, options)
}

/// Render a live snapshot, including the pool size and its change since `previous`.
pub fn format_realtime(
    realtime: &RealtimeSnapshot,
    previous: Option<&RealtimeSnapshot>,
    options: &FormatOptions,
) -> String {
    let size = realtime.pending.len();
    let pool = Pool {
        size,
        delta: previous.map(|prev| size as i64 - prev.pending.len() as i64),
    };
    render(&realtime.block, Some(pool), Some(realtime.elapsed_ms), options)
}

pub fn print_snapshot(
    snapshot: &BlockSnapshot,
    previous: Option<&BlockSnapshot>,
    options: &FormatOptions,
) {
    println!("{}", format_snapshot(snapshot, previous, options));
}

pub fn print_realtime(
    realtime: &RealtimeSnapshot,
    previous: Option<&RealtimeSnapshot>,
    options: &FormatOptions,
) {
    println!("{}", format_realtime(realtime, previous, options));
}

/// `0x1234..abcd`
fn short_hash(hash: &BlockHash) -> String {
    let hex = hex::encode(hash.as_bytes());
    format!("0x{}..{}", &hex[..4], &hex[hex.len() - 4..])
}

fn render(
    block: &BlockSnapshot,
    pool: Option<Pool>,
    elapsed_ms: Option<u64>,
    options: &FormatOptions,
) -> String {
    let t = &options.thresholds;
    let fees = options.tokens(block.total_fees);
    let transferred = options.tokens(block.total_transferred);

    let mut line = format!(
        "#{} [{}, {} fees, {} Txs ({} Eth)(<->{})]",
        block.number(),
        options.paint(
            format!("{:>6.2}%", block.weight_percent),
            t.weight_percent.level(block.weight_percent)
        ),
        options.paint(format!("{fees:>5.3}"), t.fees.level(fees)),
        options.paint(
            format!("{:>3}", block.extrinsic_count),
            t.extrinsics.level(block.extrinsic_count as f64)
        ),
        options.paint(
            format!("{:>3}", block.ethereum_count),
            t.ethereum.level(block.ethereum_count as f64)
        ),
        options.paint(
            format!("{transferred:>5.0}"),
            t.transferred.level(transferred)
        ),
    );

    if let Some(pool) = pool {
        line.push_str(&format!(
            "[Pool: {}",
            options.paint(pool.size.to_string(), t.pool.level(pool.size as f64))
        ));
        if let Some(delta) = pool.delta {
            line.push_str(&format!(
                " {}",
                options.paint(format!("({delta:+})"), t.pool_delta.level(delta as f64))
            ));
        }
        line.push(']');
    }

    if let Some(elapsed_ms) = elapsed_ms {
        let secs = elapsed_ms as f64 / 1000.0;
        line.push_str(&format!(
            "[{}]",
            options.paint(format!("{secs:.1}s"), t.elapsed_secs.level(secs))
        ));
    }

    line.push_str(&format!(
        "(hash: {}) by {}",
        short_hash(&block.hash()),
        block.author
    ));

    [options.prefix.as_str(), line.as_str(), options.suffix.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Header;

    const TOKEN: u128 = 1_000_000_000_000_000_000;

    fn sample_hash() -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes[..2].copy_from_slice(&[0x12, 0x34]);
        bytes[30..].copy_from_slice(&[0xab, 0xcd]);
        BlockHash::from(bytes)
    }

    fn snapshot(number: u64, timestamp: u64) -> BlockSnapshot {
        BlockSnapshot {
            header: Header {
                number,
                hash: sample_hash(),
                parent_hash: BlockHash::zero(),
                digest: Vec::new(),
            },
            author: "abc...wxyz".to_string(),
            timestamp,
            extrinsics: Vec::new(),
            events: Vec::new(),
            weight_percent: 45.0,
            total_fees: 5 * TOKEN / 1_000,
            total_transferred: 20 * TOKEN,
            extrinsic_count: 3,
            ethereum_count: 1,
        }
    }

    fn realtime(number: u64, timestamp: u64, pool: usize, elapsed_ms: u64) -> RealtimeSnapshot {
        let pending = crate::test_fixtures::extrinsic("System", "remark", serde_json::json!({}));
        RealtimeSnapshot {
            block: snapshot(number, timestamp),
            elapsed_ms,
            pending: vec![pending; pool],
        }
    }

    #[test]
    fn test_band_levels() {
        let band = Thresholds::default().weight_percent;
        assert_eq!(band.level(61.0), Level::Critical);
        assert_eq!(band.level(60.0), Level::Warning);
        assert_eq!(band.level(30.5), Level::Warning);
        assert_eq!(band.level(10.01), Level::Notable);
        assert_eq!(band.level(10.0), Level::Normal);
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash(&sample_hash()), "0x1234..abcd");
    }

    #[test]
    fn test_realtime_line() {
        let previous = realtime(99, 9_000, 40, 6_000);
        let current = realtime(100, 12_000, 50, 3_000);

        let line = format_realtime(&current, Some(&previous), &FormatOptions::default());
        assert!(line.contains("45.00%"), "{line}");
        assert!(line.contains(" 0.005 fees"), "{line}");
        assert!(line.contains("(+10)"), "{line}");
        assert!(line.contains("3.0s"), "{line}");
        assert!(line.contains("by abc...wxyz"), "{line}");
        assert!(line.starts_with("#100 ["), "{line}");
    }

    #[test]
    fn test_plain_line_shape() {
        let current = realtime(100, 12_000, 50, 3_000);
        let previous = realtime(99, 9_000, 40, 6_000);
        let options = FormatOptions {
            prefix: "[moonbeam]".to_string(),
            suffix: "!".to_string(),
            plain: true,
            ..Default::default()
        };

        assert_eq!(
            format_realtime(&current, Some(&previous), &options),
            "[moonbeam] #100 [ 45.00%, 0.005 fees,   3 Txs (  1 Eth)(<->   20)]\
             [Pool: 50 (+10)][3.0s](hash: 0x1234..abcd) by abc...wxyz !"
        );
    }

    #[test]
    fn test_snapshot_line_without_pool() {
        let previous = snapshot(7, 30_000);
        let current = snapshot(8, 36_500);
        let options = FormatOptions {
            plain: true,
            ..Default::default()
        };

        let line = format_snapshot(&current, Some(&previous), &options);
        assert!(!line.contains("Pool"));
        assert!(line.contains("[6.5s]"));

        let first = format_snapshot(&previous, None, &options);
        assert!(!first.contains("s]("), "{first}");
    }

    #[test]
    fn test_colors_follow_thresholds() {
        let mut current = snapshot(1, 0);
        current.weight_percent = 75.0;
        let colored = format_snapshot(&current, None, &FormatOptions::default());
        assert!(colored.contains(&Color::Red.paint(" 75.00%").to_string()));

        let plain = format_snapshot(
            &current,
            None,
            &FormatOptions {
                plain: true,
                ..Default::default()
            },
        );
        assert!(!plain.contains('\u{1b}'));
    }
}
