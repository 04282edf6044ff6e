use chrono::{DateTime, Days, NaiveTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::{BlacklistMode, Config};
use crate::ledger::store::LedgerStore;
use crate::ledger::types::{AnomalyLabel, ComplianceStatus, Location, Transaction, TransactionType};
use crate::pipeline::TransactionPipeline;
use crate::simulation::blacklist::{generate_blacklist, Blacklist};

use super::types::*;

const COMPLIANT_MARGIN: f64 = 0.05;
const PENALTY_MARGIN: f64 = 0.02;

/// Read path for dashboard clients. Never mutates the ledger.
pub struct QueryEngine {
    store: LedgerStore,
    pipeline: Arc<TransactionPipeline>,
    session_blacklist: Blacklist,
    blacklist_mode: BlacklistMode,
    blacklist_size: usize,
    default_threshold: f64,
    table_limit: usize,
}

impl QueryEngine {
    pub fn new(
        config: &Config,
        store: LedgerStore,
        pipeline: Arc<TransactionPipeline>,
        session_blacklist: Blacklist,
    ) -> Self {
        Self {
            store,
            pipeline,
            session_blacklist,
            blacklist_mode: config.compliance.blacklist_mode,
            blacklist_size: config.simulation.blacklist_size,
            default_threshold: config.compliance.amount_threshold,
            table_limit: config.api.table_limit,
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    /// Filter, reclassify and aggregate the latest ledger state.
    pub async fn query(&self, query: &ViewQuery) -> ViewResult {
        let blacklist = match self.blacklist_mode {
            BlacklistMode::PerQuery => generate_blacklist(self.blacklist_size),
            BlacklistMode::Session => self.session_blacklist.clone(),
        };
        self.query_with_blacklist(query, &blacklist).await
    }

    /// Same as [`query`](Self::query) but classifies against an explicit blacklist.
    pub async fn query_with_blacklist(&self, query: &ViewQuery, blacklist: &Blacklist) -> ViewResult {
        // Copy then release: classification and scoring run outside the lock.
        let snapshot = self.store.snapshot().await;
        let ledger_size = snapshot.len();

        let filtered = filter_transactions(snapshot, query);
        let (rows, result) = self
            .pipeline
            .enrich(filtered, query.amount_threshold, blacklist);

        tracing::debug!(
            ledger_size,
            matched = result.processed,
            non_compliant = result.non_compliant,
            anomalous = result.anomalies_detected,
            threshold = query.amount_threshold,
            "Dashboard view computed"
        );

        build_view(rows, self.table_limit)
    }

    /// Types, locations and date bounds present in the ledger.
    pub async fn filter_options(&self) -> FilterOptions {
        let snapshot = self.store.snapshot().await;
        let types: BTreeSet<TransactionType> = snapshot.iter().map(|t| t.tx_type).collect();
        let locations: BTreeSet<Location> = snapshot.iter().map(|t| t.location).collect();

        FilterOptions {
            transaction_types: types.into_iter().collect(),
            locations: locations.into_iter().collect(),
            min_date: snapshot.iter().map(|t| t.timestamp.date_naive()).min(),
            max_date: snapshot.iter().map(|t| t.timestamp.date_naive()).max(),
            default_threshold: self.default_threshold,
        }
    }
}

/// Keep rows inside `[start_date 00:00, end_date + 1 day 00:00)` with an allowed type and location.
/// Open bounds resolve to the first / last day present in `transactions`.
pub fn filter_transactions(transactions: Vec<Transaction>, query: &ViewQuery) -> Vec<Transaction> {
    let dates = || transactions.iter().map(|t| t.timestamp.date_naive());
    let (Some(start_date), Some(end_date)) = (
        query.start_date.or_else(|| dates().min()),
        query.end_date.or_else(|| dates().max()),
    ) else {
        return Vec::new();
    };
    if start_date > end_date {
        return Vec::new();
    }

    let start: DateTime<Utc> = start_date.and_time(NaiveTime::MIN).and_utc();
    let end: Option<DateTime<Utc>> = end_date
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());

    transactions
        .into_iter()
        .filter(|t| t.timestamp >= start && end.map_or(true, |end| t.timestamp < end))
        .filter(|t| query.types.contains(&t.tx_type))
        .filter(|t| query.locations.contains(&t.location))
        .collect()
}

/// Aggregate already-classified rows into summary and chart projections.
pub fn build_view(rows: Vec<Transaction>, table_limit: usize) -> ViewResult {
    if rows.is_empty() {
        return ViewResult::default();
    }

    let summary = summarize(&rows);

    let mut time_series: Vec<SeriesPoint> = rows
        .iter()
        .map(|t| SeriesPoint {
            timestamp: t.timestamp,
            amount: t.amount,
            compliance_status: t.compliance_status,
        })
        .collect();
    time_series.sort_by_key(|p| p.timestamp);

    let mut status_counts: BTreeMap<ComplianceStatus, usize> = BTreeMap::new();
    let mut by_location: BTreeMap<Location, (f64, usize)> = BTreeMap::new();
    let mut by_cell: BTreeMap<(Location, TransactionType), (f64, usize)> = BTreeMap::new();
    for t in &rows {
        *status_counts.entry(t.compliance_status).or_default() += 1;

        let entry = by_location.entry(t.location).or_default();
        entry.0 += t.amount;
        entry.1 += 1;

        let entry = by_cell.entry((t.location, t.tx_type)).or_default();
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let total = rows.len() as f64;
    let compliance_distribution = status_counts
        .iter()
        .map(|(status, count)| StatusShare {
            compliance_status: *status,
            count: *count,
            share: *count as f64 / total,
        })
        .collect();
    let compliance_histogram = status_counts
        .into_iter()
        .map(|(compliance_status, count)| StatusCount {
            compliance_status,
            count,
        })
        .collect();
    let location_amounts = by_location
        .into_iter()
        .map(|(location, (total_amount, transaction_count))| LocationAmount {
            location,
            total_amount,
            transaction_count,
        })
        .collect();
    let heatmap = by_cell
        .into_iter()
        .map(|((location, transaction_type), (sum, count))| HeatmapCell {
            location,
            transaction_type,
            mean_amount: sum / count as f64,
        })
        .collect();

    let tail_start = rows.len().saturating_sub(table_limit);
    let recent = rows[tail_start..].to_vec();

    ViewResult {
        summary,
        time_series,
        compliance_distribution,
        compliance_histogram,
        location_amounts,
        heatmap,
        recent,
    }
}

fn summarize(rows: &[Transaction]) -> Summary {
    let total_amount: f64 = rows.iter().map(|t| t.amount).sum();
    let compliant_count = rows
        .iter()
        .filter(|t| t.compliance_status == ComplianceStatus::Compliant)
        .count();
    let non_compliant_count = rows
        .iter()
        .filter(|t| t.compliance_status == ComplianceStatus::NonCompliant)
        .count();
    let anomalous_count = rows
        .iter()
        .filter(|t| t.anomaly_score == AnomalyLabel::Anomalous)
        .count();

    Summary {
        transaction_count: rows.len(),
        total_amount,
        compliant_count,
        non_compliant_count,
        anomalous_count,
        expected_profit: expected_profit(
            compliant_count,
            non_compliant_count,
            anomalous_count,
            total_amount,
        ),
    }
}

pub fn expected_profit(
    compliant: usize,
    non_compliant: usize,
    anomalous: usize,
    total_amount: f64,
) -> f64 {
    compliant as f64 * COMPLIANT_MARGIN * total_amount
        - (non_compliant + anomalous) as f64 * PENALTY_MARGIN * total_amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::*;
    use crate::simulation::synthesizer::TransactionSynthesizer;
    use chrono::{Duration, NaiveDate, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stored(seq: u64, amount: f64, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId(seq),
            timestamp,
            sender_id: format!("Account{}", 1000 + seq),
            receiver_id: format!("Account{}", 5000 + seq),
            amount,
            fee: 0.001 + seq as f64 * 1e-4,
            tx_type: TransactionType::Payment,
            status: TransactionStatus::Completed,
            compliance_status: ComplianceStatus::Compliant,
            location: Location::SaoPaulo,
            anomaly_score: AnomalyLabel::Normal,
            blockchain_status: BlockchainStatus::Registered,
            notification: "Transaction compliant".to_string(),
            compliance_reason: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn engine(store: LedgerStore, config: &Config) -> QueryEngine {
        engine_with_session(store, config, Blacklist::default())
    }

    fn engine_with_session(store: LedgerStore, config: &Config, session: Blacklist) -> QueryEngine {
        let pipeline = Arc::new(TransactionPipeline::new(&config.anomaly));
        QueryEngine::new(config, store, pipeline, session)
    }

    async fn seeded_store(count: u64) -> LedgerStore {
        let synthesizer = TransactionSynthesizer::new(30);
        let mut rng = StdRng::seed_from_u64(11);
        let start = at(2024, 3, 1, 0, 0, 0);
        let raw: Vec<Transaction> = (1..=count)
            .map(|seq| synthesizer.synthesize_with(&mut rng, seq, start))
            .collect();
        let pipeline = TransactionPipeline::new(&Config::default().anomaly);
        let (enriched, _) = pipeline.enrich(raw, 5.0, &Blacklist::default());
        let store = LedgerStore::new();
        store.extend(enriched).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_threshold_scenario() {
        let store = LedgerStore::new();
        let ts = at(2024, 5, 10, 12, 0, 0);
        for (seq, amount) in [(1, 1.0), (2, 6.0), (3, 2.0)] {
            store.append(stored(seq, amount, ts)).await.unwrap();
        }
        let engine = engine(store, &Config::default());

        let query = ViewQuery::all(day(2024, 5, 1), day(2024, 5, 31), 5.0);
        let view = engine.query_with_blacklist(&query, &Blacklist::default()).await;

        let statuses: Vec<ComplianceStatus> =
            view.recent.iter().map(|t| t.compliance_status).collect();
        assert_eq!(
            statuses,
            vec![
                ComplianceStatus::Compliant,
                ComplianceStatus::NonCompliant,
                ComplianceStatus::Compliant,
            ]
        );
        assert_eq!(view.summary.non_compliant_count, 1);
        assert_eq!(view.summary.compliant_count, 2);
        assert_eq!(view.summary.total_amount, 9.0);
        let s = &view.summary;
        assert_eq!(
            s.expected_profit,
            expected_profit(s.compliant_count, s.non_compliant_count, s.anomalous_count, 9.0)
        );
    }

    #[tokio::test]
    async fn test_blacklisted_sender_below_threshold() {
        let store = LedgerStore::new();
        let tx = stored(1, 0.5, at(2024, 5, 10, 8, 0, 0));
        let sender = tx.sender_id.clone();
        store.append(tx).await.unwrap();
        let engine = engine(store, &Config::default());

        let query = ViewQuery::all(day(2024, 5, 10), day(2024, 5, 10), 5.0);
        let view = engine
            .query_with_blacklist(&query, &Blacklist::from_accounts([sender]))
            .await;
        assert_eq!(view.recent[0].compliance_status, ComplianceStatus::NonCompliant);
    }

    #[tokio::test]
    async fn test_session_mode_uses_session_blacklist() {
        let store = LedgerStore::new();
        let tx = stored(1, 0.5, at(2024, 5, 10, 8, 0, 0));
        let session = Blacklist::from_accounts([tx.sender_id.clone()]);
        store.append(tx).await.unwrap();

        let mut config = Config::default();
        config.compliance.blacklist_mode = BlacklistMode::Session;
        let engine = engine_with_session(store, &config, session);

        let view = engine.query(&ViewQuery::unbounded(5.0)).await;
        assert_eq!(view.recent[0].compliance_status, ComplianceStatus::NonCompliant);
        assert_eq!(
            view.recent[0].compliance_reason,
            Some(ComplianceRule::BlacklistedCounterparty)
        );
    }

    #[tokio::test]
    async fn test_per_query_mode_ignores_session_blacklist() {
        let store = LedgerStore::new();
        let tx = stored(1, 0.5, at(2024, 5, 10, 8, 0, 0));
        let session = Blacklist::from_accounts([tx.sender_id.clone()]);
        store.append(tx).await.unwrap();

        let mut config = Config::default();
        config.compliance.blacklist_mode = BlacklistMode::PerQuery;
        config.simulation.blacklist_size = 0;
        let engine = engine_with_session(store, &config, session);

        let view = engine.query(&ViewQuery::unbounded(5.0)).await;
        assert_eq!(view.recent[0].compliance_status, ComplianceStatus::Compliant);
        assert_eq!(view.recent[0].compliance_reason, None);
    }

    #[tokio::test]
    async fn test_open_dates_cover_rows_appended_after_resolve() {
        let store = LedgerStore::new();
        store.append(stored(1, 1.0, at(2024, 5, 10, 8, 0, 0))).await.unwrap();
        let engine = engine(store.clone(), &Config::default());

        let query = ViewQuery::unbounded(engine.default_threshold());
        store.append(stored(2, 1.0, at(2024, 5, 11, 8, 0, 0))).await.unwrap();

        let view = engine.query(&query).await;
        assert_eq!(view.summary.transaction_count, store.len().await);
        let ids: Vec<u64> = view.recent.iter().map(|t| t.id.sequence()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_open_dates_on_empty_ledger() {
        let engine = engine(LedgerStore::new(), &Config::default());
        let view = engine.query(&ViewQuery::unbounded(5.0)).await;
        assert_eq!(view.summary, Summary::default());
    }

    #[tokio::test]
    async fn test_query_never_mutates_ledger() {
        let store = seeded_store(120).await;
        let before: Vec<(ComplianceStatus, AnomalyLabel, String)> = store
            .snapshot()
            .await
            .into_iter()
            .map(|t| (t.compliance_status, t.anomaly_score, t.notification))
            .collect();

        let engine = engine(store.clone(), &Config::default());
        let query = ViewQuery::all(day(2024, 1, 1), day(2024, 12, 31), 0.0);
        let view = engine.query(&query).await;
        assert_eq!(view.summary.non_compliant_count, 120);

        let after: Vec<(ComplianceStatus, AnomalyLabel, String)> = store
            .snapshot()
            .await
            .into_iter()
            .map(|t| (t.compliance_status, t.anomaly_score, t.notification))
            .collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_full_filter_returns_whole_ledger() {
        let store = seeded_store(300).await;
        let mut config = Config::default();
        config.api.table_limit = 1000;
        let engine = engine(store.clone(), &config);

        let query = ViewQuery::all(day(2000, 1, 1), day(2100, 1, 1), 5.0);
        let view = engine.query(&query).await;
        assert_eq!(view.summary.transaction_count, store.len().await);
        assert_eq!(view.recent.len(), 300);
        assert_eq!(
            view.summary.compliant_count + view.summary.non_compliant_count,
            300
        );
    }

    #[tokio::test]
    async fn test_count_matches_predicates() {
        let store = seeded_store(400).await;
        let engine = engine(store.clone(), &Config::default());

        let mut query = ViewQuery::all(day(2024, 3, 5), day(2024, 3, 20), 5.0);
        query.types = [TransactionType::Payment, TransactionType::Deposit]
            .into_iter()
            .collect();
        query.locations = [Location::Recife, Location::Curitiba, Location::SaoPaulo]
            .into_iter()
            .collect();

        let start = at(2024, 3, 5, 0, 0, 0);
        let end = at(2024, 3, 21, 0, 0, 0);
        let expected = store
            .snapshot()
            .await
            .iter()
            .filter(|t| t.timestamp >= start && t.timestamp < end)
            .filter(|t| query.types.contains(&t.tx_type))
            .filter(|t| query.locations.contains(&t.location))
            .count();

        let view = engine.query(&query).await;
        assert_eq!(view.summary.transaction_count, expected);
        assert!(view.summary.transaction_count <= store.len().await);
        assert!(view
            .heatmap
            .iter()
            .all(|c| query.types.contains(&c.transaction_type)));
    }

    #[tokio::test]
    async fn test_end_date_is_inclusive() {
        let store = LedgerStore::new();
        store.append(stored(1, 1.0, at(2024, 5, 9, 23, 59, 59))).await.unwrap();
        store.append(stored(2, 1.0, at(2024, 5, 10, 0, 0, 0))).await.unwrap();
        store.append(stored(3, 1.0, at(2024, 5, 10, 23, 59, 59))).await.unwrap();
        store.append(stored(4, 1.0, at(2024, 5, 11, 0, 0, 0))).await.unwrap();
        let engine = engine(store, &Config::default());

        let query = ViewQuery::all(day(2024, 5, 10), day(2024, 5, 10), 5.0);
        let view = engine.query_with_blacklist(&query, &Blacklist::default()).await;
        let ids: Vec<u64> = view.recent.iter().map(|t| t.id.sequence()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_invalid_filters_yield_empty_view() {
        let store = seeded_store(50).await;
        let engine = engine(store, &Config::default());

        let inverted = ViewQuery::all(day(2024, 4, 1), day(2024, 3, 1), 5.0);
        let view = engine.query(&inverted).await;
        assert_eq!(view.summary, Summary::default());
        assert!(view.recent.is_empty() && view.time_series.is_empty());

        let mut no_types = ViewQuery::all(day(2024, 1, 1), day(2024, 12, 31), 5.0);
        no_types.types.clear();
        assert_eq!(engine.query(&no_types).await.summary.transaction_count, 0);
    }

    #[test]
    fn test_projections() {
        let base = at(2024, 6, 1, 0, 0, 0);
        let mut rows = vec![
            stored(1, 4.0, base + Duration::hours(5)),
            stored(2, 2.0, base + Duration::hours(1)),
            stored(3, 9.0, base + Duration::hours(3)),
        ];
        rows[1].location = Location::Recife;
        rows[2].compliance_status = ComplianceStatus::NonCompliant;
        rows[2].anomaly_score = AnomalyLabel::Anomalous;

        let view = build_view(rows, 2);

        let times: Vec<u64> = view.time_series.iter().map(|p| p.amount as u64).collect();
        assert_eq!(times, vec![2, 9, 4]);

        assert_eq!(view.summary.anomalous_count, 1);
        assert_eq!(view.summary.total_amount, 15.0);
        assert_eq!(view.compliance_histogram.len(), 2);
        let shares: f64 = view.compliance_distribution.iter().map(|s| s.share).sum();
        assert!((shares - 1.0).abs() < 1e-12);

        let sao_paulo = view
            .location_amounts
            .iter()
            .find(|l| l.location == Location::SaoPaulo)
            .unwrap();
        assert_eq!(sao_paulo.total_amount, 13.0);
        assert_eq!(sao_paulo.transaction_count, 2);

        let cell = view
            .heatmap
            .iter()
            .find(|c| c.location == Location::SaoPaulo)
            .unwrap();
        assert_eq!(cell.mean_amount, 6.5);

        let recent: Vec<u64> = view.recent.iter().map(|t| t.id.sequence()).collect();
        assert_eq!(recent, vec![2, 3]);
    }

    #[test]
    fn test_expected_profit_formula() {
        // 2 * 0.05 * 10 - (1 + 1) * 0.02 * 10
        assert!((expected_profit(2, 1, 1, 10.0) - 0.6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_filter_options() {
        let store = seeded_store(200).await;
        let engine = engine(store, &Config::default());
        let options = engine.filter_options().await;
        assert!(!options.transaction_types.is_empty());
        assert!(options.min_date <= options.max_date);
        assert_eq!(options.default_threshold, 5.0);
    }

    #[test]
    fn test_summary_render() {
        let summary = Summary {
            transaction_count: 3,
            total_amount: 9.0,
            compliant_count: 2,
            non_compliant_count: 1,
            anomalous_count: 0,
            expected_profit: 0.72,
        };
        let text = summary.render();
        assert!(text.contains("Total moved: 9.00 SOL"));
        assert!(text.contains("Potential profit from automation: 0.72 SOL"));
    }
}
