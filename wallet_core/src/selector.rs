//! Coin selection.
//!
//! Coins are powers of two, so greedy selection from the largest coin below
//! the remaining need covers most targets exactly. When the small coins can
//! no longer add up to what is left, the smallest coin above it finishes
//! the selection with the least excess available from that point.

use hookpay_store::StoredCoin;

use crate::error::WalletError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub coins: Vec<StoredCoin>,
    /// `sum(coins) - target`.
    pub excess: u64,
}

impl Selection {
    pub fn total(&self) -> u64 {
        self.coins.iter().map(StoredCoin::amount).sum()
    }
}

/// Pick coins from `available` covering `target`.
pub fn select_coins(available: &[StoredCoin], target: u64) -> Result<Selection, WalletError> {
    let total: u64 = available.iter().map(StoredCoin::amount).sum();
    if total < target {
        return Err(WalletError::InsufficientFunds {
            needed: target,
            available: total,
        });
    }

    let mut pool: Vec<StoredCoin> = available.to_vec();
    pool.sort_by(|a, b| b.magnitude.cmp(&a.magnitude));

    let mut selected = Vec::new();
    let mut remaining = target;
    while remaining > 0 {
        if let Some(pos) = pool.iter().position(|c| c.amount() == remaining) {
            selected.push(pool.remove(pos));
            remaining = 0;
            break;
        }

        let below: u64 = pool
            .iter()
            .filter(|c| c.amount() < remaining)
            .map(StoredCoin::amount)
            .sum();
        if below >= remaining {
            // Sorted descending: the first coin under the need is the largest.
            let pos = pool
                .iter()
                .position(|c| c.amount() < remaining)
                .ok_or_else(|| WalletError::Invariant("coin pool changed during selection".into()))?;
            remaining -= pool[pos].amount();
            selected.push(pool.remove(pos));
        } else {
            let pos = pool
                .iter()
                .rposition(|c| c.amount() > remaining)
                .ok_or(WalletError::InsufficientFunds {
                    needed: target,
                    available: total,
                })?;
            let coin = pool.remove(pos);
            let excess = coin.amount() - remaining;
            selected.push(coin);
            return Ok(Selection {
                coins: selected,
                excess,
            });
        }
    }

    Ok(Selection {
        coins: selected,
        excess: 0,
    })
}
