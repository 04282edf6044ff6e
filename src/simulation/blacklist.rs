use rand::Rng;
use std::collections::HashSet;
use std::ops::Range;

/// Numeric account ids a blacklist is drawn from.
pub const BLACKLIST_SPACE: Range<u32> = 1000..9999;

pub fn account_id(n: u32) -> String {
    format!("Account{}", n)
}

/// A set of flagged account identifiers for one evaluation context.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    accounts: HashSet<String>,
}

impl Blacklist {
    pub fn from_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, account: &str) -> bool {
        self.accounts.contains(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.accounts.iter().map(String::as_str)
    }
}

/// Draw `count` distinct account ids without replacement.
pub fn generate_blacklist(count: usize) -> Blacklist {
    generate_blacklist_with(&mut rand::thread_rng(), count)
}

pub fn generate_blacklist_with<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Blacklist {
    let space = BLACKLIST_SPACE.len();
    let amount = count.min(space);
    let accounts = rand::seq::index::sample(rng, space, amount)
        .into_iter()
        .map(|offset| account_id(BLACKLIST_SPACE.start + offset as u32));
    Blacklist::from_accounts(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blacklist_has_distinct_ids_in_space() {
        let blacklist = generate_blacklist(10);
        assert_eq!(blacklist.len(), 10);
        for account in blacklist.iter() {
            let n: u32 = account.trim_start_matches("Account").parse().unwrap();
            assert!(BLACKLIST_SPACE.contains(&n));
        }
    }

    #[test]
    fn test_oversized_request_is_clamped() {
        let mut rng = StdRng::seed_from_u64(7);
        let blacklist = generate_blacklist_with(&mut rng, 20_000);
        assert_eq!(blacklist.len(), BLACKLIST_SPACE.len());
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(generate_blacklist(0).is_empty());
    }

    #[test]
    fn test_contains() {
        let blacklist = Blacklist::from_accounts(["Account1001", "Account2002"]);
        assert!(blacklist.contains("Account1001"));
        assert!(!blacklist.contains("Account3003"));
    }
}
